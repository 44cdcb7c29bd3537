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

use simbook_core::{CodeError, PackageSpec};
use thiserror::Error;

use crate::namespace::Namespace;
use crate::sink::ExecutionSink;

/// A package that could not be installed into the runtime.
#[derive(Error, Debug)]
#[error("{reason}")]
pub struct InstallError {
    pub reason: String,
}

impl InstallError {
    pub fn new(reason: impl Into<String>) -> Self {
        InstallError {
            reason: reason.into(),
        }
    }
}

/// The seam to the embedded language runtime.
///
/// The host drives an interpreter strictly serially: one `execute` at a
/// time, against the single persistent namespace. Output and figures are
/// written through the per-execution sink, which carries the execution id
/// explicitly, so the interpreter never tracks which execution is current.
///
/// A user-code failure is returned as [`CodeError`] data; it leaves the
/// interpreter and namespace healthy for the next execution.
pub trait Interpreter: Send {
    /// Install one package. Called once per manifest entry during init.
    fn install(&mut self, package: &PackageSpec) -> Result<(), InstallError>;

    /// Bind the standard aliases for the installed packages into the
    /// namespace. Called once after installation succeeds.
    fn bootstrap(&mut self, installed: &[PackageSpec], namespace: &mut Namespace);

    /// Execute a snippet against the persistent namespace, streaming output
    /// through `sink`. Returns the value of the final expression, if any.
    fn execute(
        &mut self,
        code: &str,
        namespace: &mut Namespace,
        sink: &mut ExecutionSink,
    ) -> Result<Option<serde_json::Value>, CodeError>;

    /// Release any open figure buffers. Called on reset.
    fn close_figures(&mut self);
}
