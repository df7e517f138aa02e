//! CLI smoke tests - verify basic command-line interface functionality
//!
//! These tests run the actual compiled binary. The config and runtime
//! directories are pointed at temp dirs so nothing on the host is touched,
//! and no PipeWire installation is assumed: without `pw-dump` the one-shot
//! query must still succeed and print an empty array.

use std::process::Command;

/// Helper to get the compiled sndwho binary, isolated from the host's
/// config and socket directories.
fn sndwho_bin(config_dir: &tempfile::TempDir, runtime_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sndwho"));
    cmd.env("XDG_CONFIG_HOME", config_dir.path());
    cmd.env("XDG_RUNTIME_DIR", runtime_dir.path());
    cmd
}

fn temp_dirs() -> (tempfile::TempDir, tempfile::TempDir) {
    (
        tempfile::tempdir().expect("tempdir"),
        tempfile::tempdir().expect("tempdir"),
    )
}

#[test]
fn cli_help_works() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("--help")
        .output()
        .expect("Failed to run sndwho --help");

    assert!(
        output.status.success(),
        "sndwho --help should exit successfully"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "Help should show usage");
    assert!(stdout.contains("daemon"), "Help should list daemon command");
    assert!(
        stdout.contains("sessions"),
        "Help should list sessions command"
    );
}

#[test]
fn cli_version_works() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("--version")
        .output()
        .expect("Failed to run sndwho --version");

    assert!(
        output.status.success(),
        "sndwho --version should exit successfully"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sndwho"), "Version should mention sndwho");
}

#[test]
fn cli_invalid_command_exits_one() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("nonexistent-command")
        .output()
        .expect("Failed to run sndwho with invalid command");

    assert_eq!(
        output.status.code(),
        Some(1),
        "argument parse failure should exit with status 1"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unrecognized") || stderr.contains("error"),
        "Should show error for invalid command"
    );
}

#[test]
fn one_shot_query_prints_json_array_and_exits_zero() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("sessions")
        .output()
        .expect("Failed to run sndwho sessions");

    // With or without a playback device present this must succeed; absence
    // of a device yields an empty array, never an error.
    assert!(
        output.status.success(),
        "one-shot query should exit 0, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert!(parsed.is_array(), "output should be a JSON array");
}

#[test]
fn status_without_daemon_reports_not_running() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("status")
        .output()
        .expect("Failed to run sndwho status");

    assert!(output.status.success(), "status should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("not running"));
}

#[test]
fn stop_without_daemon_is_an_error() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("stop")
        .output()
        .expect("Failed to run sndwho stop");

    assert!(
        !output.status.success(),
        "stop without a daemon should fail"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not running") || stderr.contains("Daemon"),
        "error should mention the missing daemon: {stderr}"
    );
}

#[test]
fn validate_creates_and_accepts_default_config() {
    let (config, runtime) = temp_dirs();
    let output = sndwho_bin(&config, &runtime)
        .arg("validate")
        .output()
        .expect("Failed to run sndwho validate");

    assert!(
        output.status.success(),
        "validate should succeed with a freshly created default config"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration valid"));
    assert!(
        config.path().join("sndwho/config.toml").exists(),
        "default config should have been created under XDG_CONFIG_HOME"
    );
}
