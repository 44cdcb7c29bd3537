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

use std::collections::HashMap;
use std::time::Instant;

use simbook_core::{CodeError, ExecutionId, ExecutionResult};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::loader::WorkerGuard;
use crate::messages::WorkerResponse;

/// Commands from the bridge to its router task.
pub(crate) enum RouterCommand {
    /// Register the waiter for the next `Ready` / id-less `Error`.
    AwaitReady(oneshot::Sender<Result<(), WorkerFailure>>),
    /// Open a pending record for a fresh execution id.
    Register(ExecutionId, oneshot::Sender<ExecutionResult>),
    /// Discard a pending record (the caller timed out); later messages for
    /// the id are dropped.
    Abandon(ExecutionId),
}

/// A global worker failure (an `Error` response carrying no execution id).
#[derive(Debug)]
pub(crate) struct WorkerFailure {
    pub message: String,
    pub traceback: Option<String>,
}

/// Bridge-owned bookkeeping for one in-flight execution.
///
/// Created on `Register`, destroyed by the terminal message or `Abandon`,
/// whichever comes first. At most one record exists per id.
struct PendingExecution {
    stdout: String,
    stderr: String,
    figures: Vec<String>,
    started_at: Instant,
    reply: oneshot::Sender<ExecutionResult>,
}

impl PendingExecution {
    fn new(reply: oneshot::Sender<ExecutionResult>) -> Self {
        PendingExecution {
            stdout: String::new(),
            stderr: String::new(),
            figures: Vec::new(),
            started_at: Instant::now(),
            reply,
        }
    }

    fn settle(self, value: Option<serde_json::Value>, error: Option<CodeError>) {
        let result = ExecutionResult {
            stdout: self.stdout,
            stderr: self.stderr,
            figures: self.figures,
            value,
            error,
            duration_ms: self.started_at.elapsed().as_millis() as u64,
        };
        // The receiver may be gone (timed out caller); settlement is
        // at-most-once either way.
        let _ = self.reply.send(result);
    }
}

/// Routes worker responses to pending executions and the init lifecycle.
///
/// Runs until the worker channel closes or the task is aborted by
/// `terminate()`. Pending replies are dropped on exit, which the awaiting
/// callers observe as a closed channel.
pub(crate) async fn run(
    mut responses: mpsc::Receiver<WorkerResponse>,
    mut commands: mpsc::UnboundedReceiver<RouterCommand>,
    _guard: WorkerGuard,
    progress: broadcast::Sender<String>,
) {
    let mut pending: HashMap<ExecutionId, PendingExecution> = HashMap::new();
    let mut ready_waiter: Option<oneshot::Sender<Result<(), WorkerFailure>>> = None;

    loop {
        tokio::select! {
            // Commands are polled first so a `Register` that was enqueued
            // before its execution was dispatched is always applied before
            // that execution's responses.
            biased;

            command = commands.recv() => {
                match command {
                    Some(RouterCommand::AwaitReady(waiter)) => {
                        ready_waiter = Some(waiter);
                    }
                    Some(RouterCommand::Register(id, reply)) => {
                        debug_assert!(!pending.contains_key(&id));
                        pending.insert(id, PendingExecution::new(reply));
                    }
                    Some(RouterCommand::Abandon(id)) => {
                        if pending.remove(&id).is_some() {
                            tracing::debug!("abandoned execution {id}");
                        }
                    }
                    None => break,
                }
            }
            response = responses.recv() => {
                match response {
                    Some(response) => {
                        handle_response(response, &mut pending, &mut ready_waiter, &progress);
                    }
                    None => {
                        tracing::debug!("worker channel closed, routing loop exiting");
                        if let Some(waiter) = ready_waiter.take() {
                            let _ = waiter.send(Err(WorkerFailure {
                                message: "worker exited before becoming ready".to_string(),
                                traceback: None,
                            }));
                        }
                        break;
                    }
                }
            }
        }
    }
}

fn handle_response(
    response: WorkerResponse,
    pending: &mut HashMap<ExecutionId, PendingExecution>,
    ready_waiter: &mut Option<oneshot::Sender<Result<(), WorkerFailure>>>,
    progress: &broadcast::Sender<String>,
) {
    match response {
        WorkerResponse::Ready => {
            if let Some(waiter) = ready_waiter.take() {
                let _ = waiter.send(Ok(()));
            }
        }
        WorkerResponse::Progress { message } => {
            let _ = progress.send(message);
        }
        WorkerResponse::Stdout { id, text } => {
            if let Some(record) = pending.get_mut(&id) {
                record.stdout.push_str(&text);
            } else {
                tracing::trace!("dropping stdout for unknown execution {id}");
            }
        }
        WorkerResponse::Stderr { id, text } => {
            if let Some(record) = pending.get_mut(&id) {
                record.stderr.push_str(&text);
            } else {
                tracing::trace!("dropping stderr for unknown execution {id}");
            }
        }
        WorkerResponse::Figure { id, data } => {
            if let Some(record) = pending.get_mut(&id) {
                record.figures.push(data);
            } else {
                tracing::trace!("dropping figure for unknown execution {id}");
            }
        }
        WorkerResponse::Result { id, value } => {
            if let Some(record) = pending.remove(&id) {
                record.settle(value, None);
            } else {
                tracing::trace!("dropping result for unknown execution {id}");
            }
        }
        WorkerResponse::Error {
            id: Some(id),
            message,
            traceback,
        } => {
            if let Some(record) = pending.remove(&id) {
                let mut error = CodeError::new(message);
                error.traceback = traceback;
                record.settle(None, Some(error));
            } else {
                tracing::trace!("dropping error for unknown execution {id}");
            }
        }
        WorkerResponse::Error {
            id: None,
            message,
            traceback,
        } => {
            // Id-less errors are bridge-fatal and belong to the init
            // lifecycle.
            if let Some(waiter) = ready_waiter.take() {
                let _ = waiter.send(Err(WorkerFailure { message, traceback }));
            } else {
                tracing::error!("worker reported a global failure: {message}");
            }
        }
    }
}
