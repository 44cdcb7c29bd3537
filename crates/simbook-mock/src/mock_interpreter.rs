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

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use simbook_core::{CodeError, PackageSpec};
use simbook_host::{ExecutionSink, InstallError, Interpreter, Namespace};

/// One step of a scripted snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MockAction {
    /// Emit a stdout fragment.
    Stdout(String),
    /// Emit a stderr fragment.
    Stderr(String),
    /// Capture a figure; the string's bytes stand in for image data.
    Figure(String),
    /// Bind a user variable into the namespace.
    Bind {
        name: String,
        value: serde_json::Value,
    },
    /// Fail with a NameError unless the name is bound.
    Require(String),
    /// Produce this as the execution's final value.
    Value(serde_json::Value),
    /// Raise a user-code error.
    Fail {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
    },
    /// Block the worker for a while (long-running user code).
    Sleep { ms: u64 },
}

/// A scripted interpreter.
///
/// `execute` looks the snippet up in the behavior map and plays its actions;
/// an unscripted snippet is treated as a bare name lookup, which succeeds
/// for bound names and raises a Python-flavored NameError otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockInterpreter {
    /// Scripted snippets, keyed by the exact code text.
    #[serde(default)]
    behaviors: IndexMap<String, Vec<MockAction>>,
    /// Packages whose installation fails.
    #[serde(default)]
    failing_packages: Vec<String>,
    #[serde(skip)]
    open_figures: usize,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the actions played for a snippet.
    pub fn script(&mut self, code: impl Into<String>, actions: Vec<MockAction>) -> &mut Self {
        self.behaviors.insert(code.into(), actions);
        self
    }

    /// Make installation of a package fail.
    pub fn fail_install(&mut self, package: impl Into<String>) -> &mut Self {
        self.failing_packages.push(package.into());
        self
    }

    /// Number of figures created since the last reset.
    pub fn open_figures(&self) -> usize {
        self.open_figures
    }
}

impl Interpreter for MockInterpreter {
    fn install(&mut self, package: &PackageSpec) -> Result<(), InstallError> {
        if self.failing_packages.iter().any(|name| *name == package.name) {
            Err(InstallError::new(format!(
                "no matching distribution found for {}",
                package.name
            )))
        } else {
            Ok(())
        }
    }

    fn bootstrap(&mut self, installed: &[PackageSpec], namespace: &mut Namespace) {
        for package in installed {
            namespace.bind_standard(
                package.binding_name(),
                serde_json::Value::String(format!("<module '{}'>", package.name)),
            );
        }
    }

    fn execute(
        &mut self,
        code: &str,
        namespace: &mut Namespace,
        sink: &mut ExecutionSink,
    ) -> Result<Option<serde_json::Value>, CodeError> {
        let Some(actions) = self.behaviors.get(code).cloned() else {
            // Unscripted snippets act as a name lookup.
            let name = code.trim();
            return match namespace.get(name) {
                Some(value) => Ok(Some(value.clone())),
                None => Err(name_error(name)),
            };
        };

        let mut value = None;
        for action in actions {
            match action {
                MockAction::Stdout(text) => sink.stdout(&text),
                MockAction::Stderr(text) => sink.stderr(&text),
                MockAction::Figure(data) => {
                    sink.figure(data.as_bytes());
                    self.open_figures += 1;
                }
                MockAction::Bind { name, value } => namespace.bind(name, value),
                MockAction::Require(name) => {
                    if !namespace.contains(&name) {
                        return Err(name_error(&name));
                    }
                }
                MockAction::Value(v) => value = Some(v),
                MockAction::Fail { message, traceback } => {
                    let mut error = CodeError::new(message);
                    error.traceback = traceback;
                    return Err(error);
                }
                MockAction::Sleep { ms } => {
                    std::thread::sleep(std::time::Duration::from_millis(ms));
                }
            }
        }
        Ok(value)
    }

    fn close_figures(&mut self) {
        self.open_figures = 0;
    }
}

fn name_error(name: &str) -> CodeError {
    CodeError::new(format!("NameError: name '{name}' is not defined")).with_traceback(format!(
        "Traceback (most recent call last):\n  File \"<exec>\", line 1, in <module>\nNameError: name '{name}' is not defined"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_deserialize_from_config_shapes() {
        let yaml_equivalent = serde_json::json!([
            {"stdout": "hello\n"},
            {"bind": {"name": "x", "value": 1}},
            {"require": "x"},
            {"value": 42},
            {"fail": {"message": "boom"}},
            {"sleep": {"ms": 5}},
        ]);
        let actions: Vec<MockAction> = serde_json::from_value(yaml_equivalent).unwrap();
        assert_eq!(actions.len(), 6);
        assert_eq!(actions[0], MockAction::Stdout("hello\n".to_string()));
        assert_eq!(
            actions[1],
            MockAction::Bind {
                name: "x".to_string(),
                value: serde_json::json!(1)
            }
        );
    }

    #[test]
    fn test_install_failure_injection() {
        let mut interpreter = MockInterpreter::new();
        interpreter.fail_install("pathsim");

        assert!(interpreter
            .install(&PackageSpec::required("numpy"))
            .is_ok());
        assert!(interpreter
            .install(&PackageSpec::required("pathsim"))
            .is_err());
    }
}
