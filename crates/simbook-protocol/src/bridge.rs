// Copyright 2025 DataStax Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

use std::sync::Arc;
use std::time::{Duration, Instant};

use error_stack::ResultExt as _;
use simbook_core::{CodeError, ExecutionId, ExecutionResult};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{BridgeError, Result};
use crate::loader::RuntimeLoader;
use crate::messages::WorkerRequest;
use crate::router::{self, RouterCommand};

/// Timeout budgets for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Budget for worker spin-up plus package installation.
    pub init_timeout: Duration,
    /// Budget for a single execution.
    pub exec_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            init_timeout: Duration::from_secs(120),
            exec_timeout: Duration::from_secs(60),
        }
    }
}

/// The controller-side endpoint of the execution protocol.
///
/// Owns the worker lifecycle and the pending-execution correlation map (via
/// its router task). All methods take `&self`; construct one bridge per
/// runtime session and pass it around by [`Arc`].
pub struct ExecutionBridge {
    loader: Arc<dyn RuntimeLoader>,
    config: BridgeConfig,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
    progress: broadcast::Sender<String>,
}

enum Lifecycle {
    Uninitialized,
    Ready(ReadyWorker),
}

struct ReadyWorker {
    requests: mpsc::Sender<WorkerRequest>,
    commands: mpsc::UnboundedSender<RouterCommand>,
    router: tokio::task::JoinHandle<()>,
}

impl ExecutionBridge {
    pub fn new(loader: Arc<dyn RuntimeLoader>, config: BridgeConfig) -> Self {
        let (progress, _) = broadcast::channel(64);
        ExecutionBridge {
            loader,
            config,
            lifecycle: tokio::sync::Mutex::new(Lifecycle::Uninitialized),
            progress,
        }
    }

    /// Subscribe to init-time progress messages. Purely observational.
    pub fn progress_events(&self) -> broadcast::Receiver<String> {
        self.progress.subscribe()
    }

    /// Initialize the runtime worker. Idempotent.
    ///
    /// Resolves immediately when the worker is already up. Otherwise loads a
    /// worker, sends `Init`, and resolves on `Ready`. Rejects on an id-less
    /// `Error`, on worker exit, or once the init timeout elapses. Concurrent
    /// callers serialize on the lifecycle lock, so exactly one worker is
    /// spun up and every caller observes the same initialization.
    pub async fn init(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if matches!(&*lifecycle, Lifecycle::Ready(_)) {
            return Ok(());
        }

        let worker = self.loader.load().change_context(BridgeError::Load)?;
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        commands
            .send(RouterCommand::AwaitReady(ready_tx))
            .map_err(|_| BridgeError::Send)?;

        let router = tokio::spawn(router::run(
            worker.responses,
            command_rx,
            worker.guard,
            self.progress.clone(),
        ));
        let requests = worker.requests;

        if let Err(e) = requests.send(WorkerRequest::Init).await {
            router.abort();
            return Err(e).change_context(BridgeError::Send);
        }

        match tokio::time::timeout(self.config.init_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {
                *lifecycle = Lifecycle::Ready(ReadyWorker {
                    requests,
                    commands,
                    router,
                });
                Ok(())
            }
            Ok(Ok(Err(failure))) => {
                router.abort();
                let mut report = error_stack::report!(BridgeError::InitFailed {
                    message: failure.message,
                });
                if let Some(traceback) = failure.traceback {
                    report = report.attach_printable(traceback);
                }
                Err(report)
            }
            Ok(Err(_closed)) => {
                router.abort();
                Err(error_stack::report!(BridgeError::WorkerExited))
            }
            Err(_elapsed) => {
                router.abort();
                Err(error_stack::report!(BridgeError::InitTimeout))
            }
        }
    }

    /// Execute a snippet and resolve with its accumulated result.
    ///
    /// Initializes the worker first, so callers never sequence `init()`
    /// manually. A user-code failure settles as `result.error`; `Err` is
    /// reserved for bridge and transport failures. When the execution budget
    /// elapses, the pending record is abandoned (late messages for the id are
    /// dropped) and the call resolves with a synthetic timeout error.
    pub async fn execute(&self, code: &str) -> Result<ExecutionResult> {
        self.init().await?;
        let (requests, commands) = self.worker_channels().await?;

        let id = ExecutionId::new();
        let (reply_tx, reply_rx) = oneshot::channel();
        commands
            .send(RouterCommand::Register(id.clone(), reply_tx))
            .map_err(|_| BridgeError::WorkerExited)?;

        let started = Instant::now();
        requests
            .send(WorkerRequest::Exec {
                id: id.clone(),
                code: code.to_string(),
            })
            .await
            .change_context(BridgeError::Send)?;

        match tokio::time::timeout(self.config.exec_timeout, reply_rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_closed)) => Err(error_stack::report!(BridgeError::WorkerExited)),
            Err(_elapsed) => {
                tracing::warn!("execution {id} timed out, abandoning");
                let _ = commands.send(RouterCommand::Abandon(id));
                Ok(ExecutionResult::from_error(
                    CodeError::timeout(self.config.exec_timeout),
                    started.elapsed().as_millis() as u64,
                ))
            }
        }
    }

    /// Clear the runtime namespace without terminating the worker.
    ///
    /// The protocol carries no reset acknowledgement; in-order delivery
    /// guarantees the reset applies before any execution sent after it.
    pub async fn reset(&self) -> Result<()> {
        self.init().await?;
        let (requests, _) = self.worker_channels().await?;
        requests
            .send(WorkerRequest::Reset)
            .await
            .change_context(BridgeError::Send)?;
        Ok(())
    }

    /// Forcibly stop the worker and return to the uninitialized state.
    ///
    /// All pending records are discarded; callers awaiting `execute()` across
    /// a terminate observe a transport error and must re-initialize. An
    /// in-flight execution is abandoned, not interrupted.
    pub async fn terminate(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Lifecycle::Ready(worker) = std::mem::replace(&mut *lifecycle, Lifecycle::Uninitialized)
        {
            // Aborting the router drops the pending map and the worker guard,
            // which kills a child process or lets a worker thread drain out.
            worker.router.abort();
        }
    }

    async fn worker_channels(
        &self,
    ) -> Result<(
        mpsc::Sender<WorkerRequest>,
        mpsc::UnboundedSender<RouterCommand>,
    )> {
        let lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            Lifecycle::Ready(worker) => Ok((worker.requests.clone(), worker.commands.clone())),
            Lifecycle::Uninitialized => Err(error_stack::report!(BridgeError::NotInitialized)),
        }
    }
}

impl std::fmt::Debug for ExecutionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
