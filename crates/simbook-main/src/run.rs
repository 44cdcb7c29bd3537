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

#![allow(clippy::print_stdout)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use simbook_core::{CellError, ExecutionResult};
use simbook_execution::CellScheduler;
use simbook_protocol::ExecutionBridge;

use crate::cli::RunArgs;
use crate::config::SimbookConfig;
use crate::notebook::Notebook;
use crate::{file_loader, MainError, Result};

/// Execute a notebook: register its cells, run the requested cell (or every
/// cell in file order) with prerequisites, render the captured output.
pub async fn execute(args: RunArgs) -> Result<()> {
    let notebook: Notebook = file_loader::load(&args.notebook)?;
    notebook.validate()?;

    let config: SimbookConfig = match &args.config {
        Some(path) => file_loader::load(path)?,
        None => SimbookConfig::default(),
    };

    let working_directory = args
        .notebook
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let bridge = Arc::new(ExecutionBridge::new(
        config.loader(working_directory)?,
        config.timeouts.bridge_config(),
    ));
    let scheduler = CellScheduler::new();
    scheduler.set_force_rerun(args.force_rerun);

    let mut progress = bridge.progress_events();
    tokio::spawn(async move {
        while let Ok(message) = progress.recv().await {
            tracing::info!("{message}");
        }
    });

    // Captured results, rendered after the chains finish.
    let results: Arc<Mutex<IndexMap<String, ExecutionResult>>> =
        Arc::new(Mutex::new(IndexMap::new()));

    for cell in &notebook.cells {
        let bridge = bridge.clone();
        let results = results.clone();
        let id = cell.id.clone();
        let code = cell.code.clone();
        scheduler.register(cell.id.clone(), cell.requires.clone(), move || {
            let bridge = bridge.clone();
            let results = results.clone();
            let id = id.clone();
            let code = code.clone();
            async move {
                let result = bridge
                    .execute(&code)
                    .await
                    .map_err(|report| CellError::new(report.to_string()))?;
                let error = result.error.clone();
                results.lock().unwrap().insert(id, result);
                match error {
                    Some(error) => Err(error.into()),
                    None => Ok(()),
                }
            }
        });
    }

    let targets: Vec<String> = match &args.cell {
        Some(id) => vec![id.clone()],
        None => notebook.cells.iter().map(|cell| cell.id.clone()).collect(),
    };

    let mut failure: Option<String> = None;
    for target in &targets {
        let outcome = scheduler.run_with_prerequisites(target).await;
        if !outcome.success {
            failure = outcome
                .error
                .or_else(|| Some(format!("cell '{target}' failed")));
            break;
        }
    }

    render(&notebook, &results.lock().unwrap());
    bridge.terminate().await;

    match failure {
        Some(error) => {
            Err(error_stack::report!(MainError::NotebookExecution).attach_printable(error))
        }
        None => {
            println!("ok: {} cell(s) executed", results.lock().unwrap().len());
            Ok(())
        }
    }
}

fn render(notebook: &Notebook, results: &IndexMap<String, ExecutionResult>) {
    for cell in &notebook.cells {
        let Some(result) = results.get(&cell.id) else {
            continue;
        };
        println!("--- {} ({} ms) ---", cell.id, result.duration_ms);
        if !result.stdout.is_empty() {
            print!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }
        if !result.figures.is_empty() {
            println!("[{} figure(s) captured]", result.figures.len());
        }
        if let Some(error) = &result.error {
            println!("error: {}", error.message);
            if let Some(traceback) = &error.traceback {
                println!("{traceback}");
            }
        }
    }
}
