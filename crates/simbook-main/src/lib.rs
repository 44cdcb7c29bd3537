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

mod cli;
mod config;
mod error;
mod file_loader;
mod logging;
mod notebook;
mod run;
mod worker;

pub use cli::{Cli, Command, RunArgs, WorkerArgs};
pub use config::{RuntimeSection, SimbookConfig, TimeoutSection};
pub use error::{MainError, Result};
pub use logging::{init_tracing, LogLevel};
pub use notebook::{Notebook, NotebookCell};
