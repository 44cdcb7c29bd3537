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

use error_stack::ResultExt as _;

use crate::logging::LogLevel;
use crate::{MainError, Result};

#[derive(clap::Parser)]
#[command(name = "simbook", version, about = "Interactive notebook execution engine")]
pub struct Cli {
    /// Log level for simbook crates.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LogLevel,
    /// Log level for everything else.
    #[arg(long, global = true, default_value = "warn")]
    pub other_log_level: LogLevel,
    /// Write logs to a file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
    /// Print failures without the full error stack.
    #[arg(long, global = true, default_value_t = false)]
    pub omit_stack_trace: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Execute a notebook's cells in dependency order.
    Run(RunArgs),
    /// Serve the execution protocol on stdin/stdout (worker sub-process).
    Worker(WorkerArgs),
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Notebook file (YAML or JSON).
    pub notebook: PathBuf,
    /// Run only this cell (with its prerequisites).
    #[arg(long)]
    pub cell: Option<String>,
    /// Re-run prerequisites even when they already succeeded.
    #[arg(long, default_value_t = false)]
    pub force_rerun: bool,
    /// Engine configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct WorkerArgs {
    /// Engine configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        match self.command {
            Command::Run(args) => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .change_context(MainError::Runtime)?;
                runtime.block_on(crate::run::execute(args))
            }
            // The worker loop is synchronous; no runtime needed.
            Command::Worker(args) => crate::worker::serve(args),
        }
    }
}
