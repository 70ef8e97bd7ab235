//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_top_level_help() {
    let mut cmd = Command::cargo_bin("postline").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("postline").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Storage backend"))
        .stdout(predicate::str::contains("--connect-retries"));
}

#[test]
fn test_serve_rejects_unknown_backend() {
    let mut cmd = Command::cargo_bin("postline").unwrap();
    cmd.env_remove("POSTLINE_BACKEND")
        .arg("serve")
        .arg("--backend")
        .arg("mongo");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown backend"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("postline").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("postline"));
}
