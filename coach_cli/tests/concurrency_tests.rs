//! Concurrency tests for coachgen.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the session store simultaneously (file locking)
//! - Read the store while other processes write to it

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("coachgen"));
    cmd.arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config.toml"), "").expect("Failed to write config");
    dir
}

fn store_lines(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("sessions.jsonl"))
        .expect("Failed to read store")
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[test]
fn test_sequential_generation_appends() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        cli(dir)
            .args(["generate", "--template", "tabata", "--minutes", "15"])
            .assert()
            .success();
    }

    assert_eq!(store_lines(dir).len(), 5);
}

#[test]
fn test_export_while_generating() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    for _ in 0..3 {
        cli(&dir).args(["generate", "--template", "emom"]).assert().success();
    }

    let export_dir = dir.clone();
    let export_handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        cli(&export_dir).arg("export").assert().success();
    });

    for _ in 0..2 {
        cli(&dir).args(["generate", "--template", "amrap"]).assert().success();
        thread::sleep(Duration::from_millis(5));
    }

    export_handle.join().expect("Export thread panicked");

    assert!(dir.join("sessions.csv").exists());
    assert_eq!(store_lines(&dir).len(), 5);
}

#[test]
fn test_no_store_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let dir: PathBuf = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                // Small stagger to reduce thundering herd
                thread::sleep(Duration::from_millis(i * 5));
                cli(&dir)
                    .args(["generate", "--template", "hyrox", "--mode", "collective"])
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let lines = store_lines(&dir);
    for line in &lines {
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(line);
        assert!(parsed.is_ok(), "Store contains invalid JSON line: {}", line);
    }
    assert_eq!(lines.len(), 10, "Expected 10 valid sessions in the store");
}
