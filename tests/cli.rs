use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn showertime(state: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("showertime");
    cmd.arg("--state").arg(state);
    cmd
}

#[test]
fn status_without_history_shows_placeholder() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("--:--:--"))
        .stdout(predicate::str::contains("Checking status..."))
        .stdout(predicate::str::contains("Interval: 24h"));
}

#[test]
fn mark_then_status_reports_fresh() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state)
        .arg("mark")
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked shower at"));

    showertime(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("You're all fresh!"));

    showertime(&state)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Shower  "));

    let saved = fs::read_to_string(&state).expect("state written");
    assert!(saved.contains("showerData"));
}

#[test]
fn duplicate_alarm_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state)
        .args(["alarm", "add", "07:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("at 07:00"));

    showertime(&state)
        .args(["alarm", "add", "7:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    showertime(&state)
        .args(["alarm", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("07:00").count(1));
}

#[test]
fn malformed_alarm_time_fails_with_clear_error() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state)
        .args(["alarm", "add", "breakfast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected HH:MM"));
}

#[test]
fn notifications_are_unsupported_without_a_terminal() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state)
        .args(["notifications", "on"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));

    showertime(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Notifications: off"));
}

#[test]
fn reset_requires_confirmation() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state).arg("mark").assert().success();
    showertime(&state)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    showertime(&state)
        .args(["reset", "--yes"])
        .assert()
        .success();
    showertime(&state)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No history yet"));
}

#[test]
fn zero_interval_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    showertime(&state)
        .args(["interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one hour"));
}

#[test]
fn corrupt_state_file_falls_back_to_defaults() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");
    fs::write(&state, "{ not-valid-json ").expect("write garbage");

    showertime(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking status..."));

    showertime(&state).args(["interval", "12"]).assert().success();
    showertime(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("Interval: 12h"));
}

#[test]
fn watch_prints_a_line_per_tick() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state.json");
    showertime(&state).arg("mark").assert().success();

    showertime(&state)
        .args(["watch", "--ticks", "3", "--period-ms", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[fresh]").count(3));
}
