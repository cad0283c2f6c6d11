// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI integration tests.
//!
//! These tests run the built bagrecord binary against recordings written by
//! the library.

mod common;

use std::fs;
use std::process::{Command, Output};

use bagrecord::StorageKind;

use common::*;

/// Run bagrecord with arguments
fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bagrecord"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run bagrecord")
}

/// Run bagrecord and assert success
fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "Command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run bagrecord and assert failure, returning stderr
fn run_err(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        !output.status.success(),
        "Command should have failed: {:?}\nstdout: {}",
        args,
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_help() {
    let stdout = run_ok(&["--help"]);
    for command in ["info", "topics", "types", "records", "schema"] {
        assert!(stdout.contains(command), "help lists {command}");
    }
}

#[test]
fn test_records_json_lines() {
    for (kind, _) in backends() {
        let (dir, _guard) = temp_dir("cli_records");
        let path = bag_path(&dir, "talker", kind);
        write_talker(&path, kind);
        let path = path.to_string_lossy().to_string();

        let stdout = run_ok(&["records", &path]);
        let lines: Vec<serde_json::Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["topic"], "test");
        assert_eq!(lines[0]["time_ns"], 1_000);
        assert_eq!(lines[0]["type"], TALKER_TYPE);
        assert_eq!(lines[0]["data"], "Hello World!");
        assert_eq!(lines[1]["data"], "Goodbye World!");
    }
}

#[test]
fn test_records_topic_filter_and_limit() {
    let (dir, _guard) = temp_dir("cli_filter");
    let path = bag_path(&dir, "two", StorageKind::Mcap);
    write_two_topics(&path, StorageKind::Mcap, 10);
    let path = path.to_string_lossy().to_string();

    let stdout = run_ok(&["records", &path, "--topic", "/count", "--limit", "2"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.contains("\"/count\"")));

    let stdout = run_ok(&["records", &path, "-t", "/label", "--format", "text"]);
    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.contains("[std_msgs/msg/String] data=\"label 1\""));
}

#[test]
fn test_topics_and_types() {
    let (dir, _guard) = temp_dir("cli_types");
    let path = bag_path(&dir, "two", StorageKind::Sqlite3);
    write_two_topics(&path, StorageKind::Sqlite3, 4);
    let path = path.to_string_lossy().to_string();

    let stdout = run_ok(&["topics", &path]);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["/count", "/label"]);

    let stdout = run_ok(&["types", &path, "--json"]);
    let types: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(types["/count"], "std_msgs/msg/Int32");
    assert_eq!(types["/label"], "std_msgs/msg/String");
}

#[test]
fn test_info() {
    let (dir, _guard) = temp_dir("cli_info");
    let path = bag_path(&dir, "two", StorageKind::Sqlite3);
    write_two_topics(&path, StorageKind::Sqlite3, 4);
    let path = path.to_string_lossy().to_string();

    let stdout = run_ok(&["info", &path]);
    assert!(stdout.contains("Storage:  sqlite3"));
    assert!(stdout.contains("Messages: 4"));
    assert!(stdout.contains("/count [std_msgs/msg/Int32] 2 messages"));
}

#[test]
fn test_schema() {
    let (dir, _guard) = temp_dir("cli_schema");
    let path = bag_path(&dir, "talker", StorageKind::Mcap);
    write_talker(&path, StorageKind::Mcap);
    let path = path.to_string_lossy().to_string();

    let stdout = run_ok(&["schema", &path, "--target", "test"]);
    assert!(stdout.contains("=== example_interfaces/msg/String ==="));
    assert!(stdout.contains("string data"));

    let stdout = run_ok(&["schema", &path, "--target", "geometry_msgs/msg/Pose"]);
    assert!(stdout.contains("geometry_msgs/msg/Point position"));
    assert!(stdout.contains("    float64 x"));
}

#[test]
fn test_config_file() {
    let (dir, _guard) = temp_dir("cli_config");
    let path = bag_path(&dir, "two", StorageKind::Mcap);
    write_two_topics(&path, StorageKind::Mcap, 6);

    let config = dir.join("reader.toml");
    fs::write(
        &config,
        format!(
            "path = {:?}\nstorage_id = \"mcap\"\ntopics = [\"/label\"]\n",
            path.display().to_string()
        ),
    )
    .unwrap();
    let config = config.to_string_lossy().to_string();

    let stdout = run_ok(&["--config", &config, "records"]);
    assert_eq!(stdout.lines().count(), 3);
}

#[test]
fn test_missing_recording_fails() {
    let stderr = run_err(&["topics", "/definitely/not/here"]);
    assert!(stderr.starts_with("Error:"));
    assert!(stderr.contains("does not exist"));

    let stderr = run_err(&["records"]);
    assert!(stderr.contains("no recording given"));
}
