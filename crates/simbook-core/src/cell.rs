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

use serde::{Deserialize, Serialize};

/// Status of a notebook cell as tracked by the scheduler.
///
/// Cells move `Idle -> Pending -> Running -> {Success | Error}`; both terminal
/// states are re-enterable when the cell is run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellStatus {
    /// Cell has never run (or was reset).
    Idle,
    /// Cell is queued behind an in-progress prerequisite chain.
    Pending,
    /// Cell's own code is currently executing.
    Running,
    /// Last run completed successfully.
    Success,
    /// Last run failed.
    Error,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Idle => "idle",
            CellStatus::Pending => "pending",
            CellStatus::Running => "running",
            CellStatus::Success => "success",
            CellStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure reported by a cell's run function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellError {
    pub message: String,
}

impl CellError {
    pub fn new(message: impl Into<String>) -> Self {
        CellError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<crate::CodeError> for CellError {
    fn from(error: crate::CodeError) -> Self {
        CellError::new(error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_status_display() {
        assert_eq!(CellStatus::Idle.to_string(), "idle");
        assert_eq!(CellStatus::Pending.to_string(), "pending");
        assert_eq!(CellStatus::Running.to_string(), "running");
        assert_eq!(CellStatus::Success.to_string(), "success");
        assert_eq!(CellStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_cell_status_serialization() {
        let json = serde_json::to_string(&CellStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");

        let parsed: CellStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, CellStatus::Pending);
    }

    #[test]
    fn test_cell_error_from_code_error() {
        let code_error = crate::CodeError::new("ZeroDivisionError").with_traceback("...");
        let cell_error: CellError = code_error.into();
        assert_eq!(cell_error.message, "ZeroDivisionError");
    }
}
