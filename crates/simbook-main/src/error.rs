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

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MainError {
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Invalid file: {}", .0.display())]
    InvalidFile(PathBuf),
    #[error("Unrecognized file extension: {}", .0.display())]
    UnrecognizedFileExtension(PathBuf),
    #[error("Failed to create output file: {}", .0.display())]
    CreateOutput(PathBuf),
    #[error("Failed to initialize tracing")]
    TracingInit,
    #[error("Failed to start async runtime")]
    Runtime,
    #[error("Configuration error")]
    Configuration,
    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),
    #[error("Notebook execution failed")]
    NotebookExecution,
}

pub type Result<T, E = error_stack::Report<MainError>> = std::result::Result<T, E>;
