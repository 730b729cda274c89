//! Integration tests for the `joinwatch` binary's exit status contract.
//!
//! - `2` when no VRChat log can be found at startup
//! - `2` for command line usage errors (unknown flag, missing value, stray argument)
//! - `2` for invalid configuration
//! - `0` for `--help`, which clap handles before startup
//!
//! Each test runs the binary with `HOME` pointed at an empty temporary
//! directory and every `JOINWATCH_*` variable removed from the child's
//! environment, so the developer's own VRChat install is never found.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Exit code for usage errors and startup failures.
const EXIT_USAGE: i32 = 2;

/// Environment variables the binary reads.
const JOINWATCH_VARS: &[&str] = &[
    "JOINWATCH_SELF_NAME",
    "JOINWATCH_TITLE",
    "JOINWATCH_ICON",
    "JOINWATCH_SOUND",
    "JOINWATCH_LOG_DIR",
    "JOINWATCH_POLL_MS",
    "JOINWATCH_ROTATION_CHECK_SECS",
];

/// Builds a command for the binary with an isolated home directory.
fn joinwatch(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_joinwatch"));
    cmd.env("HOME", home);
    for var in JOINWATCH_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn run(mut cmd: Command) -> Output {
    cmd.output().expect("Failed to execute joinwatch binary")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// Startup failures
// =============================================================================

#[test]
fn no_log_found_exits_with_usage_status() {
    let home = TempDir::new().expect("Failed to create temp dir");

    let output = run(joinwatch(home.path()));

    assert_eq!(
        output.status.code(),
        Some(EXIT_USAGE),
        "stderr: {}",
        stderr(&output)
    );
    assert!(stderr(&output).contains("VRChat log not found"));
}

#[test]
fn no_log_found_with_self_name_still_exits_with_usage_status() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = joinwatch(home.path());
    cmd.args(["--self-name", "Alice"]);

    let output = run(cmd);

    assert_eq!(output.status.code(), Some(EXIT_USAGE));
    assert!(stderr(&output).contains("VRChat log not found"));
}

#[test]
fn invalid_configuration_exits_with_usage_status() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = joinwatch(home.path());
    cmd.env("JOINWATCH_POLL_MS", "fast");

    let output = run(cmd);

    assert_eq!(output.status.code(), Some(EXIT_USAGE));
    assert!(stderr(&output).contains("JOINWATCH_POLL_MS"));
}

// =============================================================================
// Usage errors
// =============================================================================

#[test]
fn unknown_flag_is_usage_error() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = joinwatch(home.path());
    cmd.arg("--bogus");

    let output = run(cmd);

    assert_eq!(output.status.code(), Some(EXIT_USAGE));
    assert!(!output.stderr.is_empty());
}

#[test]
fn self_name_without_value_is_usage_error() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = joinwatch(home.path());
    cmd.arg("--self-name");

    let output = run(cmd);

    assert_eq!(output.status.code(), Some(EXIT_USAGE));
    assert!(stderr(&output).contains("--self-name"));
}

#[test]
fn stray_argument_is_usage_error() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = joinwatch(home.path());
    cmd.arg("stray");

    let output = run(cmd);

    assert_eq!(output.status.code(), Some(EXIT_USAGE));
}

#[test]
fn help_exits_successfully() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = joinwatch(home.path());
    cmd.arg("--help");

    let output = run(cmd);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("JOINWATCH_SELF_NAME"));
}
