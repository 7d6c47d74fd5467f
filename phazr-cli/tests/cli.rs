//! End-to-end runs of the `phazr` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = r#"
versions:
  "1.0.0":
    prepare:
      - type: script_exec
        command: "true"
        description: Prepare workspace
    deploy:
      - type: script_exec
        command: "exit 3"
        description: Deploy release
  "0.9.0":
    prepare:
      - type: script_exec
        command: "true"
        description: Prepare legacy
phases:
  - name: prepare
    groups: [prepare]
  - name: deploy
    groups: [deploy]
    depends_on: [prepare]
environment:
  name: test
  namespace: default
"#;

fn phazr(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_phazr"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("PHAZR_LOG_LEVEL", "error")
        .args(args)
        .output()
        .unwrap()
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("orchestrator.yaml"), CONFIG).unwrap();
    dir
}

#[test]
fn list_versions_in_declaration_order() {
    let dir = workspace();
    let output = phazr(dir.path(), &["list-versions"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.find("1.0.0: 2 groups, 2 operations").unwrap();
    let second = stdout.find("0.9.0: 1 groups, 1 operations").unwrap();
    assert!(first < second);
}

#[test]
fn run_single_phase_succeeds() {
    let dir = workspace();
    let output = phazr(dir.path(), &["run", "prepare"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Running phase prepare for version 1.0.0"));
    assert!(stdout.contains("SUCCESS"));
}

#[test]
fn setup_with_failing_phase_exits_nonzero() {
    let dir = workspace();
    let output = phazr(dir.path(), &["setup"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Command exited with code 3"));
}

#[test]
fn dry_run_setup_succeeds() {
    let dir = workspace();
    let output = phazr(dir.path(), &["--dry-run", "setup"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN: operations are reported, not executed"));
    assert!(stdout.contains("[DRY RUN] Would execute: Deploy release"));
}

#[test]
fn unknown_phase_lists_available() {
    let dir = workspace();
    let output = phazr(dir.path(), &["run", "teardown"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Phase 'teardown' not found. Available phases: prepare, deploy"));
}

#[test]
fn missing_config_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let output = phazr(dir.path(), &["list-phases"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading configuration"));
}

#[test]
fn merge_writes_yaml_to_stdout() {
    let dir = workspace();
    fs::write(
        dir.path().join("override.json"),
        r#"{"execution": {"max_parallel": 9}}"#,
    )
    .unwrap();

    let output = phazr(dir.path(), &["merge", "orchestrator.yaml", "override.json"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("max_parallel: 9"));
    assert!(stdout.find("1.0.0").unwrap() < stdout.find("0.9.0").unwrap());
}
