//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;

fn crysense_in(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("crysense").expect("binary should be built");
    cmd.env("CRYSENSE_CONFIG_DIR", dir.path())
        .env("CRYSENSE_DATA_DIR", dir.path())
        .env_remove("CRYSENSE_CLASSIFIER_URL")
        .env_remove("CRYSENSE_MIRROR_URL")
        .env_remove("CRYSENSE_LOG");
    cmd
}

#[test]
fn config_get_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    crysense_in(&dir)
        .args(["config", "get", "unknown_key"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    crysense_in(&dir)
        .args(["config", "set", "api_key", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    crysense_in(&dir)
        .args(["config", "set", "duration", "forever"])
        .assert()
        .failure();
    crysense_in(&dir)
        .args(["config", "set", "classifier_url", "localhost:5000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL"));
    crysense_in(&dir)
        .args(["config", "set", "history", "maybe"])
        .assert()
        .failure();

    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn config_init_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    crysense_in(&dir).args(["config", "init"]).assert().success();
    crysense_in(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn bad_duration_in_config_file_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "duration = \"soon\"\n").unwrap();

    crysense_in(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn duration_over_limit_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    crysense_in(&dir)
        .args(["-d", "10m"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("between 1s and 5m"));
}

#[test]
fn unknown_backend_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    crysense_in(&dir)
        .args(["--backend", "alsa"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid backend"));
}

#[test]
fn corrupt_history_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cry_history.json"), "{ broken").unwrap();

    crysense_in(&dir)
        .arg("history")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("corrupt"));
}
