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

use simbook_core::{ExecutionId, PackageSpec};
use simbook_protocol::{WorkerRequest, WorkerResponse};
use tokio::sync::mpsc;

use crate::interpreter::Interpreter;
use crate::namespace::Namespace;
use crate::sink::ExecutionSink;

/// Owns the embedded runtime and serves execution requests serially.
///
/// The serve loop is synchronous and expects a dedicated thread (or a worker
/// process main): long-running user code blocks only the worker, never the
/// controller. It exits when the request channel closes.
pub struct RuntimeHost {
    interpreter: Box<dyn Interpreter>,
    namespace: Namespace,
    manifest: Vec<PackageSpec>,
    initialized: bool,
}

impl RuntimeHost {
    pub fn new(interpreter: Box<dyn Interpreter>, manifest: Vec<PackageSpec>) -> Self {
        RuntimeHost {
            interpreter,
            namespace: Namespace::new(),
            manifest,
            initialized: false,
        }
    }

    /// Process requests until the controller hangs up.
    pub fn serve(
        mut self,
        mut requests: mpsc::Receiver<WorkerRequest>,
        responses: mpsc::Sender<WorkerResponse>,
    ) {
        while let Some(request) = requests.blocking_recv() {
            let delivered = match request {
                WorkerRequest::Init => self.handle_init(&responses),
                WorkerRequest::Exec { id, code } => self.handle_exec(id, &code, &responses),
                WorkerRequest::Reset => {
                    self.handle_reset();
                    true
                }
            };
            if !delivered {
                break;
            }
        }
        tracing::debug!("runtime host exiting");
    }

    fn handle_init(&mut self, responses: &mpsc::Sender<WorkerResponse>) -> bool {
        if self.initialized {
            return send(responses, WorkerResponse::Ready);
        }

        let mut installed = Vec::new();
        for package in &self.manifest {
            let progress = WorkerResponse::Progress {
                message: format!("Installing {}", package.name),
            };
            if !send(responses, progress) {
                return false;
            }
            match self.interpreter.install(package) {
                Ok(()) => installed.push(package.clone()),
                Err(e) if package.required => {
                    tracing::error!("required package '{}' failed to install: {e}", package.name);
                    // Fatal for init; the host stays uninitialized so a
                    // later `Init` can retry.
                    return send(
                        responses,
                        WorkerResponse::Error {
                            id: None,
                            message: format!(
                                "failed to install required package '{}': {e}",
                                package.name
                            ),
                            traceback: None,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!("skipping optional package '{}': {e}", package.name);
                }
            }
        }

        self.interpreter.bootstrap(&installed, &mut self.namespace);
        self.initialized = true;
        send(responses, WorkerResponse::Ready)
    }

    fn handle_exec(
        &mut self,
        id: ExecutionId,
        code: &str,
        responses: &mpsc::Sender<WorkerResponse>,
    ) -> bool {
        if !self.initialized {
            return send(
                responses,
                WorkerResponse::Error {
                    id: Some(id),
                    message: "runtime is not initialized".to_string(),
                    traceback: None,
                },
            );
        }

        let mut sink = ExecutionSink::new(id.clone(), responses.clone());
        match self.interpreter.execute(code, &mut self.namespace, &mut sink) {
            Ok(value) => send(responses, WorkerResponse::Result { id, value }),
            Err(error) => send(
                responses,
                WorkerResponse::Error {
                    id: Some(id),
                    message: error.message,
                    traceback: error.traceback,
                },
            ),
        }
    }

    fn handle_reset(&mut self) {
        self.namespace.reset();
        self.interpreter.close_figures();
        tracing::debug!("namespace reset, {} standard bindings kept", self.namespace.len());
    }
}

fn send(responses: &mpsc::Sender<WorkerResponse>, response: WorkerResponse) -> bool {
    responses.blocking_send(response).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simbook_core::CodeError;
    use crate::interpreter::InstallError;

    /// Interpreter stub that records user bindings and echoes code to stdout.
    struct EchoInterpreter {
        fail_install: Option<String>,
    }

    impl Interpreter for EchoInterpreter {
        fn install(&mut self, package: &PackageSpec) -> Result<(), InstallError> {
            match &self.fail_install {
                Some(name) if *name == package.name => {
                    Err(InstallError::new("no matching distribution"))
                }
                _ => Ok(()),
            }
        }

        fn bootstrap(&mut self, installed: &[PackageSpec], namespace: &mut Namespace) {
            for package in installed {
                namespace.bind_standard(
                    package.binding_name(),
                    serde_json::json!(format!("<module '{}'>", package.name)),
                );
            }
        }

        fn execute(
            &mut self,
            code: &str,
            namespace: &mut Namespace,
            sink: &mut ExecutionSink,
        ) -> Result<Option<serde_json::Value>, CodeError> {
            if let Some(name) = code.strip_prefix("lookup ") {
                return match namespace.get(name) {
                    Some(value) => Ok(Some(value.clone())),
                    None => Err(CodeError::new(format!(
                        "NameError: name '{name}' is not defined"
                    ))),
                };
            }
            if let Some(rest) = code.strip_prefix("bind ") {
                namespace.bind(rest, serde_json::json!(true));
                return Ok(None);
            }
            sink.stdout(code);
            sink.stdout("\n");
            Ok(None)
        }

        fn close_figures(&mut self) {}
    }

    fn serve_on_thread(
        host: RuntimeHost,
    ) -> (
        mpsc::Sender<WorkerRequest>,
        mpsc::Receiver<WorkerResponse>,
        std::thread::JoinHandle<()>,
    ) {
        let (request_tx, request_rx) = mpsc::channel(16);
        let (response_tx, response_rx) = mpsc::channel(16);
        let handle = std::thread::spawn(move || host.serve(request_rx, response_tx));
        (request_tx, response_rx, handle)
    }

    fn manifest() -> Vec<PackageSpec> {
        vec![
            PackageSpec::required("numpy").import_as("np"),
            PackageSpec::optional("scipy"),
        ]
    }

    #[test]
    fn test_init_streams_progress_then_ready() {
        let host = RuntimeHost::new(
            Box::new(EchoInterpreter { fail_install: None }),
            manifest(),
        );
        let (requests, mut responses, handle) = serve_on_thread(host);

        requests.blocking_send(WorkerRequest::Init).unwrap();
        assert_eq!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Progress {
                message: "Installing numpy".to_string()
            }
        );
        assert_eq!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Progress {
                message: "Installing scipy".to_string()
            }
        );
        assert_eq!(responses.blocking_recv().unwrap(), WorkerResponse::Ready);

        // Idempotent: a second init answers Ready without reinstalling.
        requests.blocking_send(WorkerRequest::Init).unwrap();
        assert_eq!(responses.blocking_recv().unwrap(), WorkerResponse::Ready);

        drop(requests);
        handle.join().unwrap();
    }

    #[test]
    fn test_required_install_failure_is_global_error() {
        let host = RuntimeHost::new(
            Box::new(EchoInterpreter {
                fail_install: Some("numpy".to_string()),
            }),
            manifest(),
        );
        let (requests, mut responses, handle) = serve_on_thread(host);

        requests.blocking_send(WorkerRequest::Init).unwrap();
        // Progress for numpy, then the id-less error.
        assert!(matches!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Progress { .. }
        ));
        match responses.blocking_recv().unwrap() {
            WorkerResponse::Error { id, message, .. } => {
                assert!(id.is_none());
                assert!(message.contains("numpy"));
            }
            other => panic!("expected global error, got {other:?}"),
        }

        drop(requests);
        handle.join().unwrap();
    }

    #[test]
    fn test_optional_install_failure_is_skipped() {
        let host = RuntimeHost::new(
            Box::new(EchoInterpreter {
                fail_install: Some("scipy".to_string()),
            }),
            manifest(),
        );
        let (requests, mut responses, handle) = serve_on_thread(host);

        requests.blocking_send(WorkerRequest::Init).unwrap();
        let mut saw_ready = false;
        while let Some(response) = responses.blocking_recv() {
            if response == WorkerResponse::Ready {
                saw_ready = true;
                break;
            }
            assert!(matches!(response, WorkerResponse::Progress { .. }));
        }
        assert!(saw_ready);

        // The optional package's alias was not bound.
        requests
            .blocking_send(WorkerRequest::Exec {
                id: ExecutionId::from("e1"),
                code: "lookup np".to_string(),
            })
            .unwrap();
        assert!(matches!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Result { .. }
        ));

        drop(requests);
        handle.join().unwrap();
    }

    #[test]
    fn test_reset_clears_user_bindings_only() {
        let host = RuntimeHost::new(
            Box::new(EchoInterpreter { fail_install: None }),
            manifest(),
        );
        let (requests, mut responses, handle) = serve_on_thread(host);

        requests.blocking_send(WorkerRequest::Init).unwrap();
        while responses.blocking_recv().unwrap() != WorkerResponse::Ready {}

        requests
            .blocking_send(WorkerRequest::Exec {
                id: ExecutionId::from("e1"),
                code: "bind x".to_string(),
            })
            .unwrap();
        assert!(matches!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Result { .. }
        ));

        requests.blocking_send(WorkerRequest::Reset).unwrap();

        // The standard alias survives the reset.
        requests
            .blocking_send(WorkerRequest::Exec {
                id: ExecutionId::from("e2"),
                code: "lookup np".to_string(),
            })
            .unwrap();
        match responses.blocking_recv().unwrap() {
            WorkerResponse::Result { id, value } => {
                assert_eq!(id, ExecutionId::from("e2"));
                assert_eq!(value, Some(serde_json::json!("<module 'numpy'>")));
            }
            other => panic!("expected result, got {other:?}"),
        }

        // The user binding does not.
        requests
            .blocking_send(WorkerRequest::Exec {
                id: ExecutionId::from("e3"),
                code: "lookup x".to_string(),
            })
            .unwrap();
        match responses.blocking_recv().unwrap() {
            WorkerResponse::Error { id, message, .. } => {
                assert_eq!(id, Some(ExecutionId::from("e3")));
                assert!(message.contains("NameError"));
            }
            other => panic!("expected error, got {other:?}"),
        }

        drop(requests);
        handle.join().unwrap();
    }

    #[test]
    fn test_exec_before_init_reports_error() {
        let host = RuntimeHost::new(
            Box::new(EchoInterpreter { fail_install: None }),
            manifest(),
        );
        let (requests, mut responses, handle) = serve_on_thread(host);

        requests
            .blocking_send(WorkerRequest::Exec {
                id: ExecutionId::from("early"),
                code: "print(1)".to_string(),
            })
            .unwrap();
        match responses.blocking_recv().unwrap() {
            WorkerResponse::Error { id, message, .. } => {
                assert_eq!(id, Some(ExecutionId::from("early")));
                assert!(message.contains("not initialized"));
            }
            other => panic!("expected error, got {other:?}"),
        }

        drop(requests);
        handle.join().unwrap();
    }

    #[test]
    fn test_stdout_is_tagged_and_ordered() {
        let host = RuntimeHost::new(
            Box::new(EchoInterpreter { fail_install: None }),
            manifest(),
        );
        let (requests, mut responses, handle) = serve_on_thread(host);

        requests.blocking_send(WorkerRequest::Init).unwrap();
        while responses.blocking_recv().unwrap() != WorkerResponse::Ready {}

        requests
            .blocking_send(WorkerRequest::Exec {
                id: ExecutionId::from("e1"),
                code: "hello".to_string(),
            })
            .unwrap();

        assert_eq!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Stdout {
                id: ExecutionId::from("e1"),
                text: "hello".to_string()
            }
        );
        assert_eq!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Stdout {
                id: ExecutionId::from("e1"),
                text: "\n".to_string()
            }
        );
        assert_eq!(
            responses.blocking_recv().unwrap(),
            WorkerResponse::Result {
                id: ExecutionId::from("e1"),
                value: None
            }
        );

        drop(requests);
        handle.join().unwrap();
    }
}
