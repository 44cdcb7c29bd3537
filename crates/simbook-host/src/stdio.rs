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

use std::io::BufRead as _;
use std::io::Write as _;

use simbook_core::PackageSpec;
use simbook_protocol::{WorkerRequest, WorkerResponse};
use tokio::sync::mpsc;

use crate::host::RuntimeHost;
use crate::interpreter::Interpreter;

/// Serve the wire protocol on stdin/stdout, one JSON message per line.
///
/// This is the main loop of a worker sub-process (`simbook worker`). Returns
/// when stdin closes.
pub fn serve_stdio(interpreter: Box<dyn Interpreter>, manifest: Vec<PackageSpec>) {
    let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>(100);
    let (response_tx, mut response_rx) = mpsc::channel::<WorkerResponse>(100);

    // stdin -> requests. Detached: a read may block past host exit.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("error reading stdin: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WorkerRequest>(&line) {
                Ok(request) => {
                    if request_tx.blocking_send(request).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("received invalid request: {e}");
                }
            }
        }
    });

    // responses -> stdout, flushed per line so the controller sees streamed
    // output promptly.
    let writer = std::thread::spawn(move || {
        let stdout = std::io::stdout();
        while let Some(response) = response_rx.blocking_recv() {
            let line = match serde_json::to_string(&response) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("failed to encode response: {e}");
                    continue;
                }
            };
            let mut out = stdout.lock();
            if writeln!(out, "{line}").is_err() || out.flush().is_err() {
                break;
            }
        }
    });

    RuntimeHost::new(interpreter, manifest).serve(request_rx, response_tx);

    // Host exited; the writer drains whatever is left and hangs up.
    let _ = writer.join();
}
