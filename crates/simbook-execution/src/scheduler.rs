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

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt as _;
use indexmap::IndexMap;
use simbook_core::{CellError, CellStatus};
use tokio::sync::broadcast;

/// Outcome reported when resolution finds a cycle.
pub const CIRCULAR_DEPENDENCY: &str = "Circular dependency detected";

/// A cell's run function: resolves on success, errors to signal failure.
pub type CellRunFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), CellError>> + Send + Sync>;

/// Outcome of a prerequisite-chain run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl RunOutcome {
    fn ok() -> Self {
        RunOutcome {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        RunOutcome {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A status transition, broadcast to whoever subscribes.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEvent {
    pub cell: String,
    pub status: CellStatus,
    pub execution_count: u32,
}

struct CellEntry {
    run: CellRunFn,
    prerequisites: Vec<String>,
    status: CellStatus,
    execution_count: u32,
}

/// Registry of executable cells plus the chain runner.
///
/// Prerequisite order is resolved per invocation (depth-first, with an
/// on-path set for cycle detection), so the scheduler stays correct as cells
/// register and unregister dynamically. Chains are serialized through an
/// internal run guard: at most one cell executes at a time.
pub struct CellScheduler {
    cells: Mutex<IndexMap<String, CellEntry>>,
    run_guard: tokio::sync::Mutex<()>,
    events: broadcast::Sender<CellEvent>,
    force_rerun: AtomicBool,
}

impl Default for CellScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CellScheduler {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        CellScheduler {
            cells: Mutex::new(IndexMap::new()),
            run_guard: tokio::sync::Mutex::new(()),
            events,
            force_rerun: AtomicBool::new(false),
        }
    }

    /// Subscribe to status transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<CellEvent> {
        self.events.subscribe()
    }

    /// Re-run every cell in a chain regardless of prior success.
    pub fn set_force_rerun(&self, force: bool) {
        self.force_rerun.store(force, Ordering::Relaxed);
    }

    pub fn force_rerun(&self) -> bool {
        self.force_rerun.load(Ordering::Relaxed)
    }

    /// Register a cell. Re-registering an id replaces the cell and resets
    /// its state.
    pub fn register<F, Fut>(&self, id: impl Into<String>, prerequisites: Vec<String>, run: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), CellError>> + Send + 'static,
    {
        let run: CellRunFn = Arc::new(move || run().boxed());
        self.cells.lock().unwrap().insert(
            id.into(),
            CellEntry {
                run,
                prerequisites,
                status: CellStatus::Idle,
                execution_count: 0,
            },
        );
    }

    /// Remove a cell from future resolution. An already-dispatched run is
    /// not aborted.
    pub fn unregister(&self, id: &str) {
        self.cells.lock().unwrap().shift_remove(id);
    }

    pub fn status(&self, id: &str) -> Option<CellStatus> {
        self.cells.lock().unwrap().get(id).map(|cell| cell.status)
    }

    pub fn execution_count(&self, id: &str) -> Option<u32> {
        self.cells
            .lock()
            .unwrap()
            .get(id)
            .map(|cell| cell.execution_count)
    }

    /// Set every cell back to idle with a zero execution count.
    ///
    /// Does not touch the runtime namespace; callers pair this with the
    /// bridge's `reset()`.
    pub fn reset_all_cells(&self) {
        let ids: Vec<String> = {
            let mut cells = self.cells.lock().unwrap();
            for cell in cells.values_mut() {
                cell.status = CellStatus::Idle;
                cell.execution_count = 0;
            }
            cells.keys().cloned().collect()
        };
        for id in ids {
            self.emit(&id);
        }
    }

    /// Run a cell after (re-)executing its transitive prerequisites.
    ///
    /// Resolution is depth-first (deepest prerequisite first, the requested
    /// cell last); a cycle aborts before anything runs. Prerequisites whose
    /// status is already `Success` are skipped unless force-rerun is set;
    /// the requested cell always runs. The chain executes strictly serially
    /// and halts on the first failure, reverting unreached cells to the
    /// status they held before the chain was queued.
    pub async fn run_with_prerequisites(&self, target: &str) -> RunOutcome {
        let _guard = self.run_guard.lock().await;

        let (to_run, prior) = {
            let mut cells = self.cells.lock().unwrap();
            if !cells.contains_key(target) {
                return RunOutcome::failed(format!("unknown cell '{target}'"));
            }

            let order = match resolve_order(&cells, target) {
                Ok(order) => order,
                Err(CycleDetected) => return RunOutcome::failed(CIRCULAR_DEPENDENCY),
            };

            let force = self.force_rerun.load(Ordering::Relaxed);
            let to_run: Vec<String> = order
                .into_iter()
                .filter(|id| {
                    id.as_str() == target
                        || force
                        || cells
                            .get(id)
                            .map(|cell| cell.status != CellStatus::Success)
                            .unwrap_or(false)
                })
                .collect();

            let mut prior = HashMap::new();
            for id in &to_run {
                if let Some(cell) = cells.get_mut(id) {
                    prior.insert(id.clone(), cell.status);
                    cell.status = CellStatus::Pending;
                }
            }
            (to_run, prior)
        };

        for id in &to_run {
            self.emit(id);
        }

        for (index, id) in to_run.iter().enumerate() {
            let run = {
                let mut cells = self.cells.lock().unwrap();
                match cells.get_mut(id) {
                    Some(cell) => {
                        cell.status = CellStatus::Running;
                        Some(cell.run.clone())
                    }
                    // Unregistered while queued; drop it from the chain.
                    None => None,
                }
            };
            let Some(run) = run else {
                tracing::debug!("cell '{id}' unregistered mid-chain, skipping");
                continue;
            };
            self.emit(id);

            match run().await {
                Ok(()) => {
                    if let Some(cell) = self.cells.lock().unwrap().get_mut(id) {
                        cell.status = CellStatus::Success;
                        cell.execution_count += 1;
                    }
                    self.emit(id);
                }
                Err(error) => {
                    if let Some(cell) = self.cells.lock().unwrap().get_mut(id) {
                        cell.status = CellStatus::Error;
                    }
                    self.emit(id);

                    // Fail fast: unreached cells go back to where they were.
                    let mut reverted = Vec::new();
                    {
                        let mut cells = self.cells.lock().unwrap();
                        for remaining in &to_run[index + 1..] {
                            if let Some(cell) = cells.get_mut(remaining.as_str()) {
                                if cell.status == CellStatus::Pending {
                                    cell.status = prior
                                        .get(remaining.as_str())
                                        .copied()
                                        .unwrap_or(CellStatus::Idle);
                                    reverted.push(remaining.clone());
                                }
                            }
                        }
                    }
                    for remaining in &reverted {
                        self.emit(remaining);
                    }

                    return RunOutcome::failed(format!("cell '{id}' failed: {error}"));
                }
            }
        }

        RunOutcome::ok()
    }

    fn emit(&self, id: &str) {
        let event = {
            let cells = self.cells.lock().unwrap();
            cells.get(id).map(|cell| CellEvent {
                cell: id.to_string(),
                status: cell.status,
                execution_count: cell.execution_count,
            })
        };
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}

struct CycleDetected;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    OnPath,
    Done,
}

/// Depth-first topological resolution with an on-path set.
///
/// A node encountered again while still on the current path is a cycle.
/// Prerequisite ids that are not registered are dropped from the order.
fn resolve_order(
    cells: &IndexMap<String, CellEntry>,
    target: &str,
) -> Result<Vec<String>, CycleDetected> {
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut order = Vec::new();
    visit(cells, target, &mut marks, &mut order)?;
    Ok(order)
}

fn visit(
    cells: &IndexMap<String, CellEntry>,
    id: &str,
    marks: &mut HashMap<String, Mark>,
    order: &mut Vec<String>,
) -> Result<(), CycleDetected> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::OnPath) => return Err(CycleDetected),
        None => {}
    }
    let Some(entry) = cells.get(id) else {
        tracing::debug!("prerequisite '{id}' is not registered, skipping");
        return Ok(());
    };

    marks.insert(id.to_string(), Mark::OnPath);
    for prerequisite in &entry.prerequisites {
        visit(cells, prerequisite, marks, order)?;
    }
    marks.insert(id.to_string(), Mark::Done);
    order.push(id.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_scheduler(edges: &[(&str, &[&str])]) -> CellScheduler {
        let scheduler = CellScheduler::new();
        for (id, prerequisites) in edges {
            let prerequisites = prerequisites.iter().map(|p| p.to_string()).collect();
            scheduler.register(*id, prerequisites, || async { Ok(()) });
        }
        scheduler
    }

    fn order_of(scheduler: &CellScheduler, target: &str) -> Result<Vec<String>, ()> {
        let cells = scheduler.cells.lock().unwrap();
        resolve_order(&cells, target).map_err(|CycleDetected| ())
    }

    #[test]
    fn test_resolution_is_deepest_first() {
        let scheduler = noop_scheduler(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        similar_asserts::assert_eq!(
            order_of(&scheduler, "c").unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_diamond_resolves_each_cell_once() {
        let scheduler = noop_scheduler(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("d", &["b", "c"]),
        ]);
        similar_asserts::assert_eq!(
            order_of(&scheduler, "d").unwrap(),
            vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string()
            ]
        );
    }

    #[test]
    fn test_cycle_is_detected() {
        let scheduler = noop_scheduler(&[("a", &["b"]), ("b", &["a"])]);
        assert!(order_of(&scheduler, "a").is_err());
    }

    #[test]
    fn test_self_cycle_is_detected() {
        let scheduler = noop_scheduler(&[("a", &["a"])]);
        assert!(order_of(&scheduler, "a").is_err());
    }

    #[test]
    fn test_unregistered_prerequisite_is_dropped() {
        let scheduler = noop_scheduler(&[("b", &["gone"]), ("c", &["b"])]);
        similar_asserts::assert_eq!(
            order_of(&scheduler, "c").unwrap(),
            vec!["b".to_string(), "c".to_string()]
        );
    }
}
