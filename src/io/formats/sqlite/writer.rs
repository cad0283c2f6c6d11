// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! rosbag2 SQLite writer.
//!
//! Writes the `topics`/`messages` schema rosbag2 readers expect. All
//! inserts happen inside one transaction committed by [`finish`].
//!
//! [`finish`]: RecordingSink::finish

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use crate::core::{BagError, Result};
use crate::io::metadata::{StorageKind, TopicMetadata};
use crate::io::traits::RecordingSink;

const SCHEMA: &str = "
CREATE TABLE topics (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    serialization_format TEXT NOT NULL,
    offered_qos_profiles TEXT NOT NULL
);
CREATE TABLE messages (
    id INTEGER PRIMARY KEY,
    topic_id INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    data BLOB NOT NULL
);
CREATE INDEX timestamp_idx ON messages (timestamp ASC);
CREATE TABLE message_definitions (
    id INTEGER PRIMARY KEY,
    topic_type TEXT NOT NULL,
    encoding TEXT NOT NULL,
    encoded_message_definition TEXT NOT NULL,
    type_description_hash TEXT NOT NULL
);
";

/// Writer for `.db3` recordings.
pub struct SqliteWriter {
    path: PathBuf,
    conn: Connection,
    topic_ids: HashMap<String, i64>,
    message_count: u64,
    finished: bool,
}

impl SqliteWriter {
    /// Create a new recording.
    ///
    /// `path` may name the `.db3` file directly, or a directory (created if
    /// needed) in which `<dirname>_0.db3` is written. Refuses to overwrite.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path_for(path.as_ref())?;
        if path.exists() {
            return Err(BagError::open(
                path.display().to_string(),
                "recording already exists",
            ));
        }

        let conn = Connection::open(&path)
            .map_err(|e| BagError::open(path.display().to_string(), e.to_string()))?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("BEGIN")?;
        info!(path = %path.display(), "created sqlite3 recording");

        Ok(Self {
            path,
            conn,
            topic_ids: HashMap::new(),
            message_count: 0,
            finished: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(BagError::storage("sqlite3", "writer already finished"));
        }
        Ok(())
    }
}

impl RecordingSink for SqliteWriter {
    fn storage_kind(&self) -> StorageKind {
        StorageKind::Sqlite3
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        self.ensure_open()?;
        if self.topic_ids.contains_key(&topic.name) {
            return Ok(());
        }

        self.conn.execute(
            "INSERT INTO topics (name, type, serialization_format, offered_qos_profiles) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                topic.name,
                topic.type_name,
                topic.serialization_format,
                topic.offered_qos_profiles
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        if let Some((encoding, text)) = &topic.definition {
            let known: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM message_definitions WHERE topic_type = ?1)",
                [&topic.type_name],
                |row| row.get(0),
            )?;
            if !known {
                self.conn.execute(
                    "INSERT INTO message_definitions \
                     (topic_type, encoding, encoded_message_definition, type_description_hash) \
                     VALUES (?1, ?2, ?3, '')",
                    params![topic.type_name, encoding, text],
                )?;
            }
        }

        debug!(topic = %topic.name, type_name = %topic.type_name, id, "created topic");
        self.topic_ids.insert(topic.name.clone(), id);
        Ok(())
    }

    fn write(&mut self, topic: &str, data: &[u8], time_ns: i64) -> Result<()> {
        self.ensure_open()?;
        let topic_id = *self
            .topic_ids
            .get(topic)
            .ok_or_else(|| BagError::topic_resolution(topic))?;

        let mut stmt = self
            .conn
            .prepare_cached("INSERT INTO messages (topic_id, timestamp, data) VALUES (?1, ?2, ?3)")?;
        stmt.execute(params![topic_id, time_ns, data])?;
        self.message_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        info!(
            path = %self.path.display(),
            messages = self.message_count,
            topics = self.topic_ids.len(),
            "finished sqlite3 recording"
        );
        Ok(())
    }

    fn message_count(&self) -> u64 {
        self.message_count
    }

    fn topic_count(&self) -> usize {
        self.topic_ids.len()
    }
}

impl Drop for SqliteWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish() {
                warn!(path = %self.path.display(), error = %e, "failed to commit recording on drop");
            }
        }
    }
}

fn db_path_for(path: &Path) -> Result<PathBuf> {
    if path.extension().and_then(|e| e.to_str()) == Some("db3") {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        return Ok(path.to_path_buf());
    }

    std::fs::create_dir_all(path)?;
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BagError::open(path.display().to_string(), "invalid bag directory name"))?;
    Ok(path.join(format!("{stem}_0.db3")))
}
