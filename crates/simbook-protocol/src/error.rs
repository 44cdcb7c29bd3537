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

use std::path::PathBuf;

use thiserror::Error;

/// Failures in the channel between controller and runtime worker.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("error spawning runtime worker process")]
    Spawn,
    #[error("error starting runtime worker thread")]
    SpawnThread,
    #[error("error sending message")]
    Send,
    #[error("error receiving message")]
    Recv,
    #[error("received invalid message: {0}")]
    InvalidMessage(String),
    #[error("command not found: {0}")]
    MissingCommand(String),
    #[error("invalid command: {}", .0.display())]
    InvalidCommand(PathBuf),
}

pub type TransportResult<T, E = error_stack::Report<TransportError>> = std::result::Result<T, E>;

/// Failures of the execution bridge itself.
///
/// User-code errors never appear here; they are reported inside a settled
/// [`simbook_core::ExecutionResult`].
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to load runtime worker")]
    Load,
    #[error("error sending request to runtime worker")]
    Send,
    #[error("runtime worker exited unexpectedly")]
    WorkerExited,
    #[error("runtime initialization failed: {message}")]
    InitFailed { message: String },
    #[error("runtime initialization timed out")]
    InitTimeout,
    #[error("execution bridge is not initialized")]
    NotInitialized,
}

pub type Result<T, E = error_stack::Report<BridgeError>> = std::result::Result<T, E>;
