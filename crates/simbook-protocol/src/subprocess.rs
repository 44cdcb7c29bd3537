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

use std::{ffi::OsString, path::PathBuf, process::Stdio};

use error_stack::ResultExt as _;
use indexmap::IndexMap;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::LinesStream, StreamExt as _};

use crate::error::{TransportError, TransportResult};
use crate::loader::{RuntimeLoader, SpawnedWorker, WorkerGuard};
use crate::messages::{WorkerRequest, WorkerResponse};

/// Helper for launching a runtime worker sub-process.
pub struct Launcher {
    working_directory: PathBuf,
    pub command: PathBuf,
    pub args: Vec<OsString>,
    env: IndexMap<String, String>,
}

impl Launcher {
    pub fn try_new(
        working_directory: PathBuf,
        command: String,
        args: Vec<String>,
        env: IndexMap<String, String>,
    ) -> TransportResult<Self> {
        // Bare names are resolved on the path; anything with a separator is
        // taken as given.
        let command_path = PathBuf::from(&command);
        let command_path = if command_path.components().count() > 1 {
            command_path
        } else {
            which::which(&command)
                .change_context_lazy(|| TransportError::MissingCommand(command))?
        };
        error_stack::ensure!(
            command_path.is_file(),
            TransportError::InvalidCommand(command_path)
        );

        Ok(Launcher {
            working_directory,
            command: command_path,
            args: args.into_iter().map(OsString::from).collect(),
            env,
        })
    }

    pub fn spawn(&self) -> TransportResult<Child> {
        let mut command = tokio::process::Command::new(&self.command);
        command
            .args(&self.args)
            .current_dir(&self.working_directory)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in self.env.iter() {
            command.env(key, value);
        }

        tracing::info!("spawning runtime worker: {:?}", command);
        command.spawn().change_context(TransportError::Spawn)
    }
}

/// Loads the runtime worker as a child process speaking line-delimited JSON
/// over stdio.
pub struct SubprocessLoader {
    launcher: Launcher,
}

impl SubprocessLoader {
    pub fn new(launcher: Launcher) -> Self {
        SubprocessLoader { launcher }
    }
}

impl RuntimeLoader for SubprocessLoader {
    fn load(&self) -> TransportResult<SpawnedWorker> {
        let mut child = self.launcher.spawn()?;

        let to_worker = child.stdin.take().expect("stdin requested");
        let from_worker = child.stdout.take().expect("stdout requested");
        let worker_stderr = child.stderr.take().expect("stderr requested");

        let (request_tx, mut request_rx) = mpsc::channel::<WorkerRequest>(100);
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>(100);

        let send_task = tokio::spawn(async move {
            let mut to_worker = to_worker;
            while let Some(request) = request_rx.recv().await {
                let line = match serde_json::to_string(&request) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("failed to encode request: {e}");
                        break;
                    }
                };
                if to_worker.write_all(line.as_bytes()).await.is_err()
                    || to_worker.write_all(b"\n").await.is_err()
                    || to_worker.flush().await.is_err()
                {
                    tracing::debug!("worker stdin closed");
                    break;
                }
            }
        });

        let recv_task = tokio::spawn(async move {
            let mut from_worker = LinesStream::new(BufReader::new(from_worker).lines());
            let mut worker_stderr = LinesStream::new(BufReader::new(worker_stderr).lines());
            loop {
                tokio::select! {
                    Some(line) = from_worker.next() => {
                        let line = match line {
                            Ok(line) => line,
                            Err(e) => {
                                tracing::error!("error reading from worker: {e}");
                                break;
                            }
                        };
                        match serde_json::from_str::<WorkerResponse>(&line) {
                            Ok(response) => {
                                if response_tx.send(response).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("received invalid message from worker: {e}");
                            }
                        }
                    }
                    Some(line) = worker_stderr.next() => {
                        if let Ok(line) = line {
                            tracing::warn!("worker stderr: {line}");
                        }
                    }
                    else => break,
                }
            }
        });

        Ok(SpawnedWorker {
            requests: request_tx,
            responses: response_rx,
            guard: WorkerGuard::child(child, vec![send_task, recv_task]),
        })
    }
}
