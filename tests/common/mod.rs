// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bagrecord::{CodecValue, Fields, RecordingWriter, StorageKind, TopicMetadata};

/// Topic used by the talker fixtures.
pub const TALKER_TOPIC: &str = "test";
/// Type used by the talker fixtures.
pub const TALKER_TYPE: &str = "example_interfaces/msg/String";

// ============================================================================
// Temporary Files
// ============================================================================

/// Cleanup guard for test temporary files
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Create a fresh temporary directory, removed when the guard drops.
pub fn temp_dir(tag: &str) -> (PathBuf, CleanupGuard) {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let thread_id = format!("{:?}", std::thread::current().id())
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>();
    let dir = std::env::temp_dir().join(format!(
        "bagrecord_{tag}_{}_{thread_id}_{random}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    (dir.clone(), CleanupGuard(dir))
}

/// Both storage backends with the identifier `open` expects.
pub fn backends() -> [(StorageKind, &'static str); 2] {
    [
        (StorageKind::Sqlite3, "sqlite3"),
        (StorageKind::Mcap, "mcap"),
    ]
}

/// Path of a recording named `name` inside `dir` for `kind`.
///
/// SQLite recordings are bag directories, MCAP recordings single files.
pub fn bag_path(dir: &Path, name: &str, kind: StorageKind) -> PathBuf {
    match kind {
        StorageKind::Sqlite3 => dir.join(name),
        StorageKind::Mcap => dir.join(format!("{name}.mcap")),
    }
}

// ============================================================================
// Messages
// ============================================================================

/// A message with a single `data` field.
pub fn data_message(value: CodecValue) -> Fields {
    [("data", value)].into_iter().collect()
}

/// A `geometry_msgs/msg/Pose` message.
pub fn pose_message(x: f64, y: f64, z: f64) -> Fields {
    let position: Fields = [
        ("x", CodecValue::Float64(x)),
        ("y", CodecValue::Float64(y)),
        ("z", CodecValue::Float64(z)),
    ]
    .into_iter()
    .collect();
    let orientation: Fields = [
        ("x", CodecValue::Float64(0.0)),
        ("y", CodecValue::Float64(0.0)),
        ("z", CodecValue::Float64(0.0)),
        ("w", CodecValue::Float64(1.0)),
    ]
    .into_iter()
    .collect();
    [
        ("position", CodecValue::Struct(position)),
        ("orientation", CodecValue::Struct(orientation)),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// Fixtures
// ============================================================================

/// Write the talker recording: "Hello World!" then "Goodbye World!".
pub fn write_talker(path: &Path, kind: StorageKind) {
    let mut writer = RecordingWriter::create(path, kind).unwrap();
    writer
        .create_topic(&TopicMetadata::new(TALKER_TOPIC, TALKER_TYPE))
        .unwrap();
    writer
        .write_message(
            TALKER_TOPIC,
            &data_message(CodecValue::from("Hello World!")),
            1_000,
        )
        .unwrap();
    writer
        .write_message(
            TALKER_TOPIC,
            &data_message(CodecValue::from("Goodbye World!")),
            2_000,
        )
        .unwrap();
    writer.finish().unwrap();
}

/// Write `count` messages alternating between `/count` (Int32) and
/// `/label` (String), with timestamps `100 * i`.
pub fn write_two_topics(path: &Path, kind: StorageKind, count: usize) {
    let mut writer = RecordingWriter::create(path, kind).unwrap();
    writer
        .create_topic(&TopicMetadata::new("/count", "std_msgs/msg/Int32"))
        .unwrap();
    writer
        .create_topic(&TopicMetadata::new("/label", "std_msgs/msg/String"))
        .unwrap();
    for i in 0..count {
        let time_ns = 100 * i as i64;
        if i % 2 == 0 {
            writer
                .write_message("/count", &data_message(CodecValue::Int32(i as i32)), time_ns)
                .unwrap();
        } else {
            writer
                .write_message(
                    "/label",
                    &data_message(CodecValue::String(format!("label {i}"))),
                    time_ns,
                )
                .unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Timestamps of `records`, in order.
pub fn timestamps(records: &[Fields]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.get("time_ns").and_then(CodecValue::as_i64).unwrap())
        .collect()
}

/// Topics of `records`, in order.
pub fn topics_of(records: &[Fields]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("topic").and_then(CodecValue::as_str).unwrap().to_string())
        .collect()
}
