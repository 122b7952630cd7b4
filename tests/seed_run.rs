// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end setup run through the real shell
//!
//! The workflow:
//! 1. Write a manifest with schemas, views and shell command templates
//! 2. Write a `.env.<environment>` file the commands read from
//! 3. Run `dbsetup run --yes` and check the commands ran in dependency order
//! 4. Make one seed fail and check nothing after it ran

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = r#"
[commands]
generate = "echo generate >> run.log"
migrate = "echo migrate >> run.log"
seed = "echo $SEED_TAG-{name} >> run.log"
view = "echo {kind}-{name} >> run.log"

[[schemas]]
name = "drink_configs"
dependencies = ["drink_types", "container_types"]

[[schemas]]
name = "container_types"

[[schemas]]
name = "drink_types"

[[views]]
name = "drink_menu"
dependencies = ["drink_summary"]

[[views]]
name = "drink_summary"
"#;

fn setup(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("dbsetup.toml"), manifest).unwrap();
    std::fs::write(dir.path().join(".env.development"), "SEED_TAG=dev\n").unwrap();
    std::fs::write(dir.path().join(".env.staging"), "SEED_TAG=stage\n").unwrap();
    dir
}

fn dbsetup(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbsetup").unwrap();
    cmd.env_remove("SEED_TAG")
        .env_remove("DBSETUP_ENVIRONMENT")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(dir.path().join("dbsetup.toml"));
    cmd
}

fn log_lines(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("run.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_full_run_in_dependency_order() {
    let dir = setup(MANIFEST);

    dbsetup(&dir)
        .args(["run", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ran 7 step(s):"));

    assert_eq!(
        log_lines(dir.path()),
        vec![
            "generate",
            "migrate",
            "dev-drink_types",
            "dev-container_types",
            "dev-drink_configs",
            "view-drink_summary",
            "view-drink_menu",
        ]
    );
}

#[test]
fn test_environment_selects_env_file() {
    let dir = setup(MANIFEST);

    dbsetup(&dir)
        .args(["run", "--schema", "drink_types", "--env", "staging", "--skip-migrations"])
        .assert()
        .success();

    assert_eq!(log_lines(dir.path()), vec!["stage-drink_types"]);
}

#[test]
fn test_failing_seed_halts_sequence() {
    let manifest = MANIFEST.replace(
        "seed = \"echo $SEED_TAG-{name} >> run.log\"",
        "seed = \"test {name} != container_types && echo {name} >> run.log\"",
    );
    let dir = setup(&manifest);

    dbsetup(&dir)
        .args(["run", "--yes", "--skip-migrations"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[FAILED] seed container_types"))
        .stdout(predicate::str::contains("Not run:"))
        .stderr(predicate::str::contains("Step 'seed container_types' failed (exit code 1)"));

    assert_eq!(log_lines(dir.path()), vec!["drink_types"]);
}

#[test]
fn test_missing_dependency_runs_nothing() {
    let dir = setup(MANIFEST);

    dbsetup(&dir)
        .args(["run", "--schema", "drink_configs", "--view", "drink_summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "schema drink_configs requires drink_types, container_types",
        ))
        .stderr(predicate::str::contains("Selection is incomplete"));

    assert!(!dir.path().join("run.log").exists());
}
