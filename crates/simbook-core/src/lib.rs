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

//! Shared types for the simbook interactive execution engine.
//!
//! These types are the common vocabulary of the workspace:
//!
//! - [`ExecutionId`] / [`ExecutionResult`] / [`CodeError`] - one code
//!   execution against the runtime, from request to settled result.
//! - [`CellStatus`] / [`CellError`] - scheduler-facing cell state.
//! - [`PackageSpec`] - runtime packages installed at init time.

mod cell;
mod execution;
mod packages;

pub use cell::{CellError, CellStatus};
pub use execution::{CodeError, ExecutionId, ExecutionResult};
pub use packages::{default_manifest, PackageSpec};
