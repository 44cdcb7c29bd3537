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

//! Wire protocol and controller-side execution bridge.
//!
//! The protocol is a line-delimited JSON message-passing channel between a
//! controller and an isolated runtime worker:
//!
//! - [`WorkerRequest`] / [`WorkerResponse`] - the message union types.
//! - [`ExecutionBridge`] - correlates concurrent requests by execution id,
//!   accumulates streamed output, enforces timeouts, and exposes the
//!   `init` / `execute` / `reset` / `terminate` lifecycle.
//! - [`RuntimeLoader`] - the bootstrap seam; the bridge works identically
//!   over an in-process worker thread or a [`SubprocessLoader`]-spawned
//!   child process.

mod bridge;
mod error;
mod loader;
mod messages;
mod router;
mod subprocess;

pub use bridge::{BridgeConfig, ExecutionBridge};
pub use error::{BridgeError, Result, TransportError, TransportResult};
pub use loader::{RuntimeLoader, SpawnedWorker, WorkerGuard};
pub use messages::{WorkerRequest, WorkerResponse};
pub use subprocess::{Launcher, SubprocessLoader};
