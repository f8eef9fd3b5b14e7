//! Integration tests for the CLI surface: help, version, argument validation.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn switchboard() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("switchboard"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    // clap with arg_required_else_help shows help on stderr and exits 2.
    // NO_COLOR counts as a present argument and would suppress the help.
    switchboard()
        .env_remove("NO_COLOR")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Watch and start/stop cloud compute instances",
        ));
}

#[test]
fn test_cli_help_lists_commands() {
    let output = switchboard().arg("--help").output().expect("run");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["status", "watch", "start", "stop", "config", "version"] {
        assert!(help.contains(command), "missing {command} in:\n{help}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    switchboard()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("switchboard"));
}

#[test]
fn test_version_command_shows_version() {
    switchboard()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!("switchboard v", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = switchboard()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_start_help_shows_wait_flags() {
    switchboard()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--wait"))
        .stdout(predicate::str::contains("--timeout-secs"));
}

// --- Validation happens before any provider call ---

#[test]
fn test_start_rejects_malformed_instance_id() {
    switchboard()
        .args(["start", "web-server"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid instance ID 'web-server'"));
}

#[test]
fn test_stop_without_instance_is_usage_error() {
    switchboard().arg("stop").assert().code(2);
}

#[test]
fn test_json_errors_are_json_objects() {
    let output = switchboard()
        .args(["stop", "nope", "--json"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert!(
        value["message"]
            .as_str()
            .is_some_and(|m| m.contains("Invalid instance ID"))
    );
}

#[test]
fn test_status_rejects_out_of_range_interval_override() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    switchboard()
        .args(["status", "--interval-ms", "10"])
        .env("SWITCHBOARD_CONFIG", dir.path().join("config.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for poll.interval_ms: 10"));
}

#[test]
fn test_watch_rejects_malformed_tracked_instance() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    switchboard()
        .args(["watch", "-i", "i-zz"])
        .env("SWITCHBOARD_CONFIG", dir.path().join("config.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid instance ID 'i-zz'"));
}
