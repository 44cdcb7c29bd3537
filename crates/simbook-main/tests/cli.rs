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

//! End-to-end runs of the `simbook` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

fn simbook() -> Command {
    Command::new(env!("CARGO_BIN_EXE_simbook"))
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

const MOCK_CONFIG: &str = r#"
runtime:
  mock:
    behaviors:
      "x = 1":
        - bind: {name: x, value: 1}
      "print(x)":
        - require: x
        - stdout: "1\n"
      "1/0":
        - fail: {message: "ZeroDivisionError: division by zero"}
packages:
  - name: numpy
    importAs: np
"#;

const NOTEBOOK: &str = r#"
name: demo
cells:
  - id: setup
    code: "x = 1"
  - id: show
    code: "print(x)"
    requires: [setup]
"#;

#[test]
fn test_run_executes_cells_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.yaml", MOCK_CONFIG);
    let notebook = write(dir.path(), "notebook.yaml", NOTEBOOK);

    let output = simbook()
        .arg("run")
        .arg(&notebook)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    // `show` saw the binding made by `setup` through the shared namespace.
    assert!(stdout.contains("--- setup"), "stdout: {stdout}");
    assert!(stdout.contains("--- show"), "stdout: {stdout}");
    assert!(stdout.contains("1\n"), "stdout: {stdout}");
    assert!(stdout.contains("ok: 2 cell(s) executed"), "stdout: {stdout}");
}

#[test]
fn test_run_reports_failing_cell() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.yaml", MOCK_CONFIG);
    let notebook = write(
        dir.path(),
        "notebook.yaml",
        r#"
cells:
  - id: boom
    code: "1/0"
"#,
    );

    let output = simbook()
        .arg("run")
        .arg(&notebook)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("ZeroDivisionError"),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_run_single_cell_with_prerequisites() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.yaml", MOCK_CONFIG);
    let notebook = write(
        dir.path(),
        "notebook.yaml",
        r#"
cells:
  - id: setup
    code: "x = 1"
  - id: show
    code: "print(x)"
    requires: [setup]
  - id: unrelated
    code: "1/0"
"#,
    );

    let output = simbook()
        .arg("run")
        .arg(&notebook)
        .arg("--cell")
        .arg("show")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    // The failing cell is not in `show`'s chain and never ran.
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("--- show"), "stdout: {stdout}");
    assert!(!stdout.contains("--- unrelated"), "stdout: {stdout}");
}

#[test]
fn test_run_over_subprocess_worker() {
    let dir = tempfile::tempdir().unwrap();
    let worker_config = write(dir.path(), "worker.yaml", MOCK_CONFIG);
    let notebook = write(dir.path(), "notebook.yaml", NOTEBOOK);

    let controller_config = write(
        dir.path(),
        "config.yaml",
        &format!(
            r#"
runtime:
  subprocess:
    command: "{bin}"
    args: ["worker", "--config", "{worker_config}"]
packages:
  - name: numpy
    importAs: np
"#,
            bin = env!("CARGO_BIN_EXE_simbook"),
            worker_config = worker_config.display(),
        ),
    );

    let output = simbook()
        .arg("run")
        .arg(&notebook)
        .arg("--config")
        .arg(&controller_config)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("ok: 2 cell(s) executed"), "stdout: {stdout}");
}
