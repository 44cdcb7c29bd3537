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

use base64::Engine as _;
use simbook_core::ExecutionId;
use simbook_protocol::WorkerResponse;
use tokio::sync::mpsc;

/// Streams one execution's output back to the controller, tagged with the
/// execution id.
///
/// A sink is scoped to a single `execute` call, so every fragment it emits
/// is attributed to the right execution by construction; there is no
/// current-execution slot to go stale. Fragments are delivered in emission
/// order, ahead of the terminal message.
pub struct ExecutionSink {
    id: ExecutionId,
    responses: mpsc::Sender<WorkerResponse>,
    disconnected: bool,
}

impl ExecutionSink {
    pub fn new(id: ExecutionId, responses: mpsc::Sender<WorkerResponse>) -> Self {
        ExecutionSink {
            id,
            responses,
            disconnected: false,
        }
    }

    pub fn id(&self) -> &ExecutionId {
        &self.id
    }

    pub fn stdout(&mut self, text: &str) {
        let response = WorkerResponse::Stdout {
            id: self.id.clone(),
            text: text.to_string(),
        };
        self.emit(response);
    }

    pub fn stderr(&mut self, text: &str) {
        let response = WorkerResponse::Stderr {
            id: self.id.clone(),
            text: text.to_string(),
        };
        self.emit(response);
    }

    /// Capture a rendered figure, encoding the raw image bytes as base64.
    pub fn figure(&mut self, image: &[u8]) {
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        let response = WorkerResponse::Figure {
            id: self.id.clone(),
            data,
        };
        self.emit(response);
    }

    fn emit(&mut self, response: WorkerResponse) {
        if self.disconnected {
            return;
        }
        // An abandoned execution (controller gone) keeps running; its output
        // is dropped from here on.
        if self.responses.blocking_send(response).is_err() {
            self.disconnected = true;
            tracing::debug!("controller gone, dropping output for {}", self.id);
        }
    }
}
