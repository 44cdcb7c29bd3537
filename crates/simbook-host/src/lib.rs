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

//! Worker-side runtime host.
//!
//! The host owns one embedded language runtime (behind the [`Interpreter`]
//! seam) and its persistent [`Namespace`], processes requests strictly
//! serially, tags every output fragment with its execution id, and captures
//! figures as base64 payloads.
//!
//! Two ways to run it:
//!
//! - [`InProcessLoader`] - the host serves on a dedicated thread inside the
//!   controller process.
//! - [`serve_stdio`] - the host serves line-delimited JSON on stdin/stdout,
//!   for use as a worker sub-process.

mod host;
mod in_process;
mod interpreter;
mod namespace;
mod sink;
mod stdio;

pub use host::RuntimeHost;
pub use in_process::InProcessLoader;
pub use interpreter::{InstallError, Interpreter};
pub use namespace::Namespace;
pub use sink::ExecutionSink;
pub use stdio::serve_stdio;
