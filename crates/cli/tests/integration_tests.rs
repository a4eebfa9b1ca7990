//! Integration tests for kartctl CLI
//!
//! Every command workflow is exercised through the built binary, including
//! exit codes and JSON output.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Custom predicate to check if output is valid JSON
fn is_json() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        if let Ok(text) = std::str::from_utf8(s) {
            serde_json::from_str::<Value>(text).is_ok()
        } else {
            false
        }
    })
}

/// Test helper to create a kartctl command
fn kartctl() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kartctl")?;
    cmd.env_remove("KARTCTL_CONFIG");
    Ok(cmd)
}

fn stdout_json(output: &std::process::Output) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn test_cli_help() -> TestResult {
    kartctl()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulated kart"));
    Ok(())
}

#[test]
fn test_cli_version() -> TestResult {
    kartctl()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kartctl"));
    Ok(())
}

// --- config ---

#[test]
fn test_config_show_defaults_json() -> TestResult {
    let output = kartctl()?
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(is_json())
        .get_output()
        .clone();
    let value = stdout_json(&output)?;
    assert_eq!(value["success"], true);
    assert_eq!(value["config"]["schema_version"], "kart.config/1");
    assert_eq!(value["config"]["ramp"]["period_ms"], 50);
    assert_eq!(value["config"]["link"]["motor_encoding"], "signed_offset");
    Ok(())
}

#[test]
fn test_config_init_then_validate() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("kart.yaml");

    kartctl()?
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(fs::read_to_string(&path)?.contains("schema_version"));

    kartctl()?
        .args(["config", "validate", "--json"])
        .arg(&path)
        .assert()
        .success()
        .stdout(is_json())
        .stdout(predicate::str::contains("\"valid\": true"));
    Ok(())
}

#[test]
fn test_config_init_refuses_existing_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("kart.json");
    fs::write(&path, "{}")?;

    kartctl()?
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("--force"));

    kartctl()?
        .args(["config", "init", "--force"])
        .arg(&path)
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_config_validate_rejects_invalid_values() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("kart.json");
    fs::write(&path, r#"{"ramp":{"step":0}}"#)?;

    kartctl()?
        .args(["config", "validate", "--json"])
        .arg(&path)
        .assert()
        .code(4)
        .stdout(is_json())
        .stdout(predicate::str::contains("\"type\": \"config\""));
    Ok(())
}

#[test]
fn test_config_validate_missing_file() -> TestResult {
    kartctl()?
        .args(["config", "validate", "/nonexistent/kart.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Failed to read"));
    Ok(())
}

#[test]
fn test_config_show_yaml_uses_global_config() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("kart.yml");
    fs::write(&path, "link:\n  motor_encoding: unsigned\n")?;

    kartctl()?
        .args(["config", "show", "--yaml"])
        .env("KARTCTL_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("motor_encoding: unsigned"));
    Ok(())
}

// --- encode / decode ---

#[test]
fn test_encode_motor_signed_offset() -> TestResult {
    let output = kartctl()?
        .args(["encode", "motor", "50", "--json"])
        .assert()
        .success()
        .stdout(is_json())
        .get_output()
        .clone();
    let value = stdout_json(&output)?;
    assert_eq!(value["payload"]["byte"], 150);
    assert_eq!(value["payload"]["channel"], "motor");
    assert_eq!(value["hex"], "0x96");
    Ok(())
}

#[test]
fn test_encode_motor_reverse() -> TestResult {
    kartctl()?
        .args(["encode", "motor", "-100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("byte 0"));
    Ok(())
}

#[test]
fn test_encode_motor_unsigned_from_config() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("kart.json");
    fs::write(&path, r#"{"link":{"motor_encoding":"unsigned"}}"#)?;

    let output = kartctl()?
        .args(["encode", "motor", "50", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)?["payload"]["byte"], 50);

    kartctl()?
        .args(["encode", "motor", "-10", "--config"])
        .arg(&path)
        .assert()
        .code(4);
    Ok(())
}

#[test]
fn test_encode_steering_out_of_range() -> TestResult {
    kartctl()?
        .args(["encode", "steering", "181", "--json"])
        .assert()
        .code(4)
        .stdout(is_json())
        .stdout(predicate::str::contains("\"type\": \"validation\""));
    Ok(())
}

#[test]
fn test_decode_steering_and_motor() -> TestResult {
    kartctl()?
        .args(["decode", "steering", "0x5a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steering"))
        .stdout(predicate::str::contains("90°"));

    let output = kartctl()?
        .args(["decode", "motor", "100", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)?["payload"]["value"], 0);

    kartctl()?
        .args(["decode", "motor", "201"])
        .assert()
        .code(4);
    Ok(())
}

// --- simulate ---

#[test]
fn test_simulate_inline_steps() -> TestResult {
    let output = kartctl()?
        .args([
            "simulate", "--json", "--step", "connect", "--step", "throttle", "--step",
            "wait 100", "--step", "release",
        ])
        .assert()
        .success()
        .stdout(is_json())
        .get_output()
        .clone();
    let value = stdout_json(&output)?;
    assert_eq!(value["simulation"]["duration_ms"], 100);
    assert_eq!(value["simulation"]["stats"]["connects"], 1);

    let motor: Vec<(u64, u64)> = value["simulation"]["frames"]
        .as_array()
        .map(|frames| {
            frames
                .iter()
                .filter(|f| f["channel"] == "motor")
                .filter_map(|f| Some((f["t_ms"].as_u64()?, f["byte"].as_u64()?)))
                .collect()
        })
        .unwrap_or_default();
    // sync on connect, two ticks, dead-man release, shutdown stop
    assert_eq!(
        motor,
        vec![(0, 100), (50, 105), (100, 110), (100, 100), (100, 100)]
    );
    Ok(())
}

#[test]
fn test_simulate_script_file() -> TestResult {
    let dir = TempDir::new()?;
    let script = dir.path().join("drive.kart");
    fs::write(
        &script,
        "# drive off and lose the link\nconnect\nthrottle\nwait 300\ndrop\n",
    )?;

    kartctl()?
        .args(["simulate", "--script"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Connection lost: link lost"))
        .stdout(predicate::str::contains("1 drops"));
    Ok(())
}

#[test]
fn test_simulate_script_error_reports_line() -> TestResult {
    kartctl()?
        .args(["simulate", "--step", "connect", "--step", "launch"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Script line 2"));
    Ok(())
}

#[test]
fn test_simulate_requires_steps() -> TestResult {
    kartctl()?
        .arg("simulate")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nothing to simulate"));
    Ok(())
}

#[test]
fn test_unknown_command_fails() -> TestResult {
    kartctl()?.arg("launch").assert().failure();
    Ok(())
}
