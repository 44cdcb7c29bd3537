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

use std::sync::Arc;

use error_stack::ResultExt as _;
use simbook_core::PackageSpec;
use simbook_protocol::{
    RuntimeLoader, SpawnedWorker, TransportError, TransportResult, WorkerGuard,
};
use tokio::sync::mpsc;

use crate::host::RuntimeHost;
use crate::interpreter::Interpreter;

/// Runs the runtime host on a dedicated thread inside the controller
/// process.
///
/// The loader is re-invoked after a terminate, so it holds an interpreter
/// factory rather than an interpreter: each load gets a fresh runtime and a
/// fresh namespace.
pub struct InProcessLoader {
    factory: Arc<dyn Fn() -> Box<dyn Interpreter> + Send + Sync>,
    manifest: Vec<PackageSpec>,
}

impl InProcessLoader {
    pub fn new(
        factory: impl Fn() -> Box<dyn Interpreter> + Send + Sync + 'static,
        manifest: Vec<PackageSpec>,
    ) -> Self {
        InProcessLoader {
            factory: Arc::new(factory),
            manifest,
        }
    }
}

impl RuntimeLoader for InProcessLoader {
    fn load(&self) -> TransportResult<SpawnedWorker> {
        let (request_tx, request_rx) = mpsc::channel(100);
        let (response_tx, response_rx) = mpsc::channel(100);

        let host = RuntimeHost::new((self.factory)(), self.manifest.clone());
        let thread = std::thread::Builder::new()
            .name("simbook-host".to_string())
            .spawn(move || host.serve(request_rx, response_tx))
            .change_context(TransportError::SpawnThread)?;

        Ok(SpawnedWorker {
            requests: request_tx,
            responses: response_rx,
            guard: WorkerGuard::thread(thread),
        })
    }
}
