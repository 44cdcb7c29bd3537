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

use tokio::sync::mpsc;

use crate::error::TransportResult;
use crate::messages::{WorkerRequest, WorkerResponse};

/// Strategy for bringing up a runtime worker.
///
/// The bridge is agnostic to where the worker lives: an in-process thread, a
/// child process speaking line-delimited JSON, or anything else that yields a
/// pair of message channels. Loaders are re-invoked after `terminate()`, so a
/// loader must be able to produce a fresh worker each time.
pub trait RuntimeLoader: Send + Sync {
    fn load(&self) -> TransportResult<SpawnedWorker>;
}

/// Channel endpoints of a running worker, plus the handle that keeps it alive.
pub struct SpawnedWorker {
    pub requests: mpsc::Sender<WorkerRequest>,
    pub responses: mpsc::Receiver<WorkerResponse>,
    pub guard: WorkerGuard,
}

/// Owns whatever must be reclaimed when the worker is discarded.
///
/// Dropping the guard aborts pump tasks and kills a child process; a worker
/// thread is left to drain out on its own once its request channel closes.
pub struct WorkerGuard {
    child: Option<tokio::process::Child>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl WorkerGuard {
    /// A guard with nothing to reclaim (tests and in-memory wiring).
    pub fn detached() -> Self {
        WorkerGuard {
            child: None,
            tasks: Vec::new(),
            thread: None,
        }
    }

    pub fn thread(handle: std::thread::JoinHandle<()>) -> Self {
        WorkerGuard {
            child: None,
            tasks: Vec::new(),
            thread: Some(handle),
        }
    }

    pub fn child(child: tokio::process::Child, tasks: Vec<tokio::task::JoinHandle<()>>) -> Self {
        WorkerGuard {
            child: Some(child),
            tasks,
            thread: None,
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Some(child) = &mut self.child {
            if let Err(e) = child.start_kill() {
                tracing::debug!("worker process already gone: {e}");
            }
        }
        // The thread handle is dropped (detached); the serve loop exits when
        // its request channel closes.
        self.thread.take();
    }
}
