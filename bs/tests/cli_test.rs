//! Binary-level tests for `bs`
//!
//! Only offline paths are exercised: configuration and input errors, and runs
//! whose credentials all fail derivation before any network call.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_config(dir: &Path) -> PathBuf {
    let config = format!(
        r#"
run:
  cooldown-ms: 0
files:
  credentials: {dir}/priv.txt
  proxies: {dir}/proxies.txt
  success: {dir}/success.txt
  fail: {dir}/fail.txt
"#,
        dir = dir.display()
    );
    let path = dir.join("batchsubmit.yml");
    fs::write(&path, config).expect("write config");
    path
}

fn bs(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bs").expect("binary built");
    cmd.current_dir(dir)
        .env("XDG_DATA_HOME", dir.join("data"))
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_missing_credentials_exits_nonzero() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(dir.path());

    bs(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load credentials"));
}

#[test]
fn test_empty_credentials_exits_nonzero() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(dir.path());
    fs::write(dir.path().join("priv.txt"), "\n   \n").expect("write credentials");

    bs(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entries found"));
}

#[test]
fn test_unreadable_config_exits_nonzero() {
    let dir = TempDir::new().expect("Failed to create temp dir");

    bs(dir.path())
        .arg("--config")
        .arg(dir.path().join("absent.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_zero_concurrency_is_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(dir.path());
    fs::write(dir.path().join("priv.txt"), "garbage\n").expect("write credentials");

    bs(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--concurrency", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn test_run_with_only_bad_credentials_completes() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(dir.path());
    fs::write(dir.path().join("priv.txt"), "garbage\n0x1234\n").expect("write credentials");

    bs(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Tasks"))
        .stdout(predicate::str::contains("not found, continuing without proxies"));

    let fail = fs::read_to_string(dir.path().join("fail.txt")).expect("fail log exists");
    let mut lines: Vec<&str> = fail.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["invalid:0x1234", "invalid:garbage"]);
    assert_eq!(fs::read_to_string(dir.path().join("success.txt")).expect("success log exists"), "");
    assert!(dir.path().join("data/batchsubmit/logs/batchsubmit.log").exists());
}

#[test]
fn test_json_summary() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(dir.path());
    fs::write(dir.path().join("priv.txt"), "garbage\n").expect("write credentials");

    let output = bs(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--format", "json"])
        .output()
        .expect("run bs");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(report["summary"]["total_tasks"], 1);
    assert_eq!(report["summary"]["fail_count"], 1);
    assert_eq!(report["tasks"][0]["status"], "failure");
    // Secrets never reach the report
    assert!(!String::from_utf8_lossy(&output.stdout).contains("garbage"));
}
