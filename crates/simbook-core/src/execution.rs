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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier correlating one execution request with its streamed output and
/// terminal result. Never reused while the execution is pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Generate a fresh execution id.
    pub fn new() -> Self {
        ExecutionId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        ExecutionId(s.to_string())
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        ExecutionId(s)
    }
}

/// An error raised by the executed snippet itself.
///
/// User-code failures are ordinary data, not transport failures: they travel
/// back inside a settled [`ExecutionResult`] rather than breaking the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl CodeError {
    pub fn new(message: impl Into<String>) -> Self {
        CodeError {
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    /// The synthetic error produced when an execution exceeds its budget.
    pub fn timeout(budget: Duration) -> Self {
        CodeError::new(format!(
            "Execution timed out after {} seconds",
            budget.as_secs()
        ))
    }
}

impl std::fmt::Display for CodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The settled outcome of a single execution.
///
/// Produced exactly once per `execute()` call by concatenating the streamed
/// fragments in arrival order at settlement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// Base64-encoded image payloads, in creation order.
    pub figures: Vec<String>,
    /// Value of the final expression, when the runtime reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CodeError>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// A result carrying only an error, with no captured output.
    pub fn from_error(error: CodeError, duration_ms: u64) -> Self {
        ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            figures: Vec::new(),
            value: None,
            error: Some(error),
            duration_ms,
        }
    }
}
