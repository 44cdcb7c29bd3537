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

use simbook_host::Interpreter;

use crate::cli::WorkerArgs;
use crate::config::{RuntimeSection, SimbookConfig};
use crate::{file_loader, MainError, Result};

/// Serve the wire protocol on stdio until the controller hangs up.
pub fn serve(args: WorkerArgs) -> Result<()> {
    let config: SimbookConfig = match &args.config {
        Some(path) => file_loader::load(path)?,
        None => SimbookConfig::default(),
    };

    let manifest = config.manifest();
    let interpreter: Box<dyn Interpreter> = match config.runtime {
        RuntimeSection::Mock(mock) => Box::new(mock),
        RuntimeSection::Subprocess { .. } => {
            return Err(error_stack::report!(MainError::Configuration)
                .attach_printable("a worker cannot itself use a subprocess runtime"));
        }
    };

    tracing::info!("worker serving on stdio");
    simbook_host::serve_stdio(interpreter, manifest);
    Ok(())
}
