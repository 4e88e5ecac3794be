//! Runs the daemon against a synthetic Claude rollout and checks that
//! `obscope status` reports it after a couple of ticks.

use assert_cmd::cargo::cargo_bin;
use obscope_testing::{process::BackgroundProcess, ClaudeRolloutBuilder};
use predicates::prelude::*;
use std::process::Command;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn daemon_picks_up_a_session_and_status_reports_it() {
    let home = tempdir().unwrap();
    let data_dir = tempdir().unwrap();

    let claude_root = home.path().join(".claude/projects");
    std::fs::create_dir_all(&claude_root).unwrap();

    ClaudeRolloutBuilder::new("test-session-1", "/workspace/demo")
        .user_turn("u1", chrono::Utc::now(), "add a health check endpoint")
        .assistant_text("a1", chrono::Utc::now(), "claude-3-5-sonnet-20241022", "Sure, adding it now.", 120, 340)
        .write_into_log_root(&claude_root)
        .unwrap();

    let mut run_cmd = Command::new(cargo_bin("obscope"));
    run_cmd
        .env("HOME", home.path())
        .env("OBSCOPE_PATH", data_dir.path())
        .arg("run");

    let mut daemon = BackgroundProcess::spawn_piped(run_cmd).unwrap();
    std::thread::sleep(Duration::from_millis(2500));
    let _ = daemon.kill();
    let _ = daemon.wait_timeout(Duration::from_secs(2));

    let snapshot_path = data_dir.path().join("snapshot.json");
    assert!(snapshot_path.exists(), "daemon never persisted a snapshot");

    let mut status_cmd = assert_cmd::Command::new(cargo_bin("obscope"));
    status_cmd.env("OBSCOPE_PATH", data_dir.path()).arg("status");
    status_cmd
        .assert()
        .success()
        .stdout(predicates::str::contains("agents: 0").not());
}
