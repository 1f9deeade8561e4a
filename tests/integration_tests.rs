//! Integration tests for the AirSight CLI

use std::process::Command;

fn airsight() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_airsight"));
    // keep the user's config file out of the way
    cmd.args(["--config", "/nonexistent/airsight.toml"]);
    cmd
}

/// Test that the CLI shows help with explicit help flag
#[test]
fn test_cli_explicit_help() {
    let output = airsight()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("airsight"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("interactive"));
}

/// Test that running without a command prints the configured endpoints
#[test]
fn test_default_output_shows_config_hints() {
    let output = airsight()
        .env("AIRSIGHT_GEOCODING__BASE_URL", "http://127.0.0.1:9/search")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("http://127.0.0.1:9/search"));
    assert!(stdout.contains("air-quality-api.open-meteo.com"));
}

/// Invalid input is rejected before any request is made
#[test]
fn test_check_rejects_invalid_form() {
    let output = airsight()
        .args(["check", "--city", "X", "--region", ""])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid input"));
    assert!(stderr.contains("City must be at least 2 characters"));
    assert!(stderr.contains("State/province/region is required"));
}

/// Test that an invalid configuration value stops the CLI
#[test]
fn test_invalid_config_is_reported() {
    let output = airsight()
        .env("AIRSIGHT_GEOCODING__TIMEOUT_SECONDS", "0")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

/// Unreachable services surface the connection message and a failing exit code
#[test]
fn test_check_unreachable_service() {
    let output = airsight()
        .env("AIRSIGHT_GEOCODING__BASE_URL", "http://127.0.0.1:9/search")
        .env("AIRSIGHT_GEOCODING__TIMEOUT_SECONDS", "2")
        .args(["check", "--city", "Lisboa", "--region", "Lisboa", "--country", "Portugal"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Check your internet connection") || stderr.contains("Timed out"),
        "unexpected stderr: {stderr}"
    );
}
