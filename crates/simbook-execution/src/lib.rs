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

//! Dependency-ordered cell scheduling.
//!
//! The [`CellScheduler`] tracks a registry of executable cells and resolves
//! prerequisite chains per invocation, so "run cell N" transparently
//! (re-)executes any prerequisites first - in topological order, exactly
//! once, with cycle detection and fail-fast halting. Status changes are
//! broadcast as [`CellEvent`]s; the scheduler does not care who listens.

mod scheduler;

pub use scheduler::{CellEvent, CellRunFn, CellScheduler, RunOutcome, CIRCULAR_DEPENDENCY};
