//! CLI integration tests.
//!
//! These tests run the snapkit binary end-to-end. They cover paths that
//! fail or finish before the snapper daemon is reached, and point the bus
//! at an address nobody listens on.

use std::process::{Command, Output};
use tempfile::TempDir;

/// Command for the snapkit binary, isolated from the user's settings.
fn snapkit(temp: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_snapkit"));
    command
        .env("SNAPKIT_CONFIG", temp.path().join("missing.json"))
        .env("SNAPKIT_BUS_ADDRESS", unreachable_bus(temp))
        .env_remove("SNAPKIT_DEFAULT_CONFIG")
        .env_remove("SNAPKIT_SNAPPER")
        .env_remove("SNAPKIT_JOB_KEY")
        .env_remove("RUST_LOG");
    command
}

fn unreachable_bus(temp: &TempDir) -> String {
    format!("unix:path={}", temp.path().join("no-bus").display())
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_help_command() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Inspect, diff and undo snapper snapshots"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("undo-job"));
}

#[test]
fn test_version_flag() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(stdout(&output).contains("snapkit"));
}

#[test]
fn test_invalid_subcommand() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .arg("frobnicate")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_run_requires_command() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .arg("run")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_invalid_settings_file() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("config.json");
    std::fs::write(&path, "{ not json").expect("Failed to write settings");

    let output = snapkit(&temp)
        .env("SNAPKIT_CONFIG", &path)
        .arg("list")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid settings file"));
}

#[test]
fn test_unreachable_bus_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .arg("list")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("listing snapshots"));
}

#[test]
fn test_post_snapshot_requires_pre() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .args(["create", "--type", "post", "--description", "after"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("pre snapshot number needs to be specified"));
}

#[test]
fn test_bad_cleanup_algorithm() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .args(["create", "--cleanup", "weekly"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("weekly"));
}

#[test]
fn test_config_set_needs_assignments() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let output = snapkit(&temp)
        .args(["config", "set", "NUMBER_LIMIT"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Expected KEY=VALUE"));
}
