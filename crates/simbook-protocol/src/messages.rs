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
use simbook_core::ExecutionId;

/// Requests sent from the controller to the runtime worker.
///
/// Only `Exec` carries an execution id; lifecycle requests are uncorrelated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerRequest {
    /// Install packages and prepare the namespace. Idempotent.
    Init,
    /// Execute a snippet against the persistent namespace.
    Exec { id: ExecutionId, code: String },
    /// Clear user bindings and release figure resources.
    Reset,
}

/// Responses sent from the runtime worker to the controller.
///
/// Several `Stdout` / `Stderr` / `Figure` messages may arrive for the same id
/// before its terminal `Result` or `Error`; arrival order is preserved by the
/// transport. An `Error` with no id is a global (init) failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerResponse {
    /// Initialization finished; the worker accepts executions.
    Ready,
    /// Init-time progress, for UI feedback only.
    Progress { message: String },
    Stdout {
        id: ExecutionId,
        text: String,
    },
    Stderr {
        id: ExecutionId,
        text: String,
    },
    /// A captured figure, base64-encoded.
    Figure {
        id: ExecutionId,
        data: String,
    },
    /// Terminal message for a successful execution.
    Result {
        id: ExecutionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    /// Terminal message for a failed execution (id present), or a global
    /// failure (id absent).
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ExecutionId>,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    #[test]
    fn test_request_wire_shape() {
        let request = WorkerRequest::Exec {
            id: ExecutionId::from("exec-1"),
            code: "print(1)".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"kind": "exec", "id": "exec-1", "code": "print(1)"})
        );

        let init = serde_json::to_value(WorkerRequest::Init).unwrap();
        assert_eq!(init, json!({"kind": "init"}));
    }

    #[test]
    fn test_response_round_trips() {
        let responses = vec![
            WorkerResponse::Ready,
            WorkerResponse::Progress {
                message: "Installing numpy".to_string(),
            },
            WorkerResponse::Stdout {
                id: ExecutionId::from("e"),
                text: "hello\n".to_string(),
            },
            WorkerResponse::Figure {
                id: ExecutionId::from("e"),
                data: "aGk=".to_string(),
            },
            WorkerResponse::Result {
                id: ExecutionId::from("e"),
                value: Some(json!(3.5)),
            },
            WorkerResponse::Error {
                id: None,
                message: "install failed".to_string(),
                traceback: None,
            },
        ];

        for response in responses {
            let line = serde_json::to_string(&response).unwrap();
            let parsed: WorkerResponse = serde_json::from_str(&line).unwrap();
            assert_eq!(parsed, response);
        }
    }

    #[test]
    fn test_error_without_id_omits_field() {
        let error = WorkerResponse::Error {
            id: None,
            message: "boom".to_string(),
            traceback: None,
        };
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value, json!({"kind": "error", "message": "boom"}));
    }

    #[test]
    fn test_result_without_value_parses() {
        let parsed: WorkerResponse =
            serde_json::from_str(r#"{"kind": "result", "id": "e"}"#).unwrap();
        assert_eq!(
            parsed,
            WorkerResponse::Result {
                id: ExecutionId::from("e"),
                value: None,
            }
        );
    }
}
