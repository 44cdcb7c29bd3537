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
use std::sync::Arc;
use std::time::Duration;

use error_stack::ResultExt as _;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use simbook_core::{default_manifest, PackageSpec};
use simbook_host::InProcessLoader;
use simbook_mock::MockInterpreter;
use simbook_protocol::{BridgeConfig, Launcher, RuntimeLoader, SubprocessLoader};

use crate::{MainError, Result};

/// Engine configuration: which runtime to load, which packages to install,
/// and the timeout budgets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimbookConfig {
    #[serde(default, with = "serde_yaml_ng::with::singleton_map_recursive")]
    pub runtime: RuntimeSection,
    /// Packages installed at init; defaults to the simulation-docs set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<PackageSpec>>,
    #[serde(default)]
    pub timeouts: TimeoutSection,
}

/// Where the runtime worker comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuntimeSection {
    /// Scripted in-process runtime (tests, demos).
    Mock(MockInterpreter),
    /// External worker process speaking the wire protocol over stdio.
    Subprocess {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: IndexMap<String, String>,
    },
}

impl Default for RuntimeSection {
    fn default() -> Self {
        RuntimeSection::Mock(MockInterpreter::new())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutSection {
    #[serde(default = "default_init_ms")]
    pub init_ms: u64,
    #[serde(default = "default_exec_ms")]
    pub exec_ms: u64,
}

fn default_init_ms() -> u64 {
    120_000
}

fn default_exec_ms() -> u64 {
    60_000
}

impl Default for TimeoutSection {
    fn default() -> Self {
        TimeoutSection {
            init_ms: default_init_ms(),
            exec_ms: default_exec_ms(),
        }
    }
}

impl TimeoutSection {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            init_timeout: Duration::from_millis(self.init_ms),
            exec_timeout: Duration::from_millis(self.exec_ms),
        }
    }
}

impl SimbookConfig {
    pub fn manifest(&self) -> Vec<PackageSpec> {
        self.packages.clone().unwrap_or_else(default_manifest)
    }

    /// Build the runtime loader described by this configuration.
    pub fn loader(&self, working_directory: PathBuf) -> Result<Arc<dyn RuntimeLoader>> {
        let manifest = self.manifest();
        match &self.runtime {
            RuntimeSection::Mock(interpreter) => {
                let interpreter = interpreter.clone();
                Ok(Arc::new(InProcessLoader::new(
                    move || Box::new(interpreter.clone()),
                    manifest,
                )))
            }
            RuntimeSection::Subprocess { command, args, env } => {
                let launcher = Launcher::try_new(
                    working_directory,
                    command.clone(),
                    args.clone(),
                    env.clone(),
                )
                .change_context(MainError::Configuration)?;
                Ok(Arc::new(SubprocessLoader::new(launcher)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: SimbookConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert!(matches!(config.runtime, RuntimeSection::Mock(_)));
        assert!(config.packages.is_none());
        assert_eq!(config.timeouts.init_ms, 120_000);
        assert_eq!(config.timeouts.exec_ms, 60_000);
    }

    #[test]
    fn test_subprocess_config_parses() {
        let yaml = r#"
runtime:
  subprocess:
    command: python
    args: ["worker.py"]
timeouts:
  execMs: 5000
"#;
        let config: SimbookConfig = serde_yaml_ng::from_str(yaml).unwrap();
        match &config.runtime {
            RuntimeSection::Subprocess { command, args, .. } => {
                assert_eq!(command, "python");
                assert_eq!(args, &["worker.py".to_string()]);
            }
            other => panic!("expected subprocess runtime, got {other:?}"),
        }
        assert_eq!(config.timeouts.exec_ms, 5000);
        assert_eq!(config.timeouts.init_ms, 120_000);
    }

    #[test]
    fn test_mock_config_with_behaviors() {
        let yaml = r#"
runtime:
  mock:
    behaviors:
      "print('hi')":
        - stdout: "hi\n"
packages:
  - name: numpy
    importAs: np
"#;
        let config: SimbookConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(matches!(config.runtime, RuntimeSection::Mock(_)));
        let manifest = config.manifest();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].binding_name(), "np");
    }
}
