// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential cursor over a rosbag2 SQLite database.
//!
//! Messages are read one row at a time with keyset pagination on
//! `(timestamp, id)`, so no statement outlives a call and the cursor never
//! holds more than one pending row.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, warn};

use crate::core::{BagError, Result};
use crate::io::filter::StorageFilter;
use crate::io::metadata::{RawEntry, RecordingStats, StorageKind, TopicMetadata};
use crate::io::traits::SequentialCursor;

/// A topic row with its database id.
#[derive(Debug, Clone)]
struct TopicRow {
    id: i64,
    metadata: TopicMetadata,
}

/// A fetched message with its ordering key.
#[derive(Debug)]
struct PendingRow {
    key: (i64, i64),
    entry: RawEntry,
}

/// Cursor over a `.db3` file.
pub struct SqliteCursor {
    path: PathBuf,
    conn: Connection,
    topics: Vec<TopicRow>,
    /// Topic ids allowed by the filter; `None` = all
    allowed: Option<Vec<i64>>,
    /// Key of the last message returned
    position: (i64, i64),
    pending: Option<PendingRow>,
}

impl SqliteCursor {
    /// Open a rosbag2 database (the `.db3` file or a bag directory holding one).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let requested = path.as_ref();
        let db_path = resolve_db_path(requested)?;
        let display = requested.display().to_string();

        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| BagError::open(&display, e.to_string()))?;

        let tables = table_names(&conn).map_err(|e| BagError::open(&display, e.to_string()))?;
        for required in ["topics", "messages"] {
            if !tables.iter().any(|t| t == required) {
                return Err(BagError::open(
                    &display,
                    format!("not a rosbag2 database (missing '{required}' table)"),
                ));
            }
        }

        let topics = load_topics(&conn, tables.iter().any(|t| t == "message_definitions"))
            .map_err(|e| BagError::open(&display, e.to_string()))?;
        debug!(
            path = %db_path.display(),
            topics = topics.len(),
            "opened sqlite3 recording"
        );

        Ok(Self {
            path: db_path,
            conn,
            topics,
            allowed: None,
            position: (i64::MIN, i64::MIN),
            pending: None,
        })
    }

    fn fetch_after(&self, key: (i64, i64)) -> Result<Option<PendingRow>> {
        let id_clause = match &self.allowed {
            None => String::new(),
            Some(ids) if ids.is_empty() => return Ok(None),
            Some(ids) => {
                let list: Vec<String> = ids.iter().map(i64::to_string).collect();
                format!(" AND m.topic_id IN ({})", list.join(","))
            }
        };
        let sql = format!(
            "SELECT m.timestamp, m.id, t.name, m.data \
             FROM messages m JOIN topics t ON m.topic_id = t.id \
             WHERE (m.timestamp > ?1 OR (m.timestamp = ?1 AND m.id > ?2)){id_clause} \
             ORDER BY m.timestamp, m.id LIMIT 1"
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let row = stmt
            .query_row(params![key.0, key.1], |row| {
                let timestamp: i64 = row.get(0)?;
                let id: i64 = row.get(1)?;
                let topic: String = row.get(2)?;
                let data: Vec<u8> = row.get(3)?;
                Ok(PendingRow {
                    key: (timestamp, id),
                    entry: RawEntry::new(topic, data, timestamp),
                })
            })
            .optional()?;
        Ok(row)
    }
}

impl SequentialCursor for SqliteCursor {
    fn storage_kind(&self) -> StorageKind {
        StorageKind::Sqlite3
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.fetch_after(self.position)?;
        }
        Ok(self.pending.is_some())
    }

    fn read_next(&mut self) -> Result<RawEntry> {
        let row = match self.pending.take() {
            Some(row) => row,
            None => self
                .fetch_after(self.position)?
                .ok_or_else(|| BagError::storage("sqlite3", "no more messages"))?,
        };
        self.position = row.key;
        Ok(row.entry)
    }

    fn topics_and_types(&self) -> Result<Vec<TopicMetadata>> {
        Ok(self.topics.iter().map(|t| t.metadata.clone()).collect())
    }

    fn set_filter(&mut self, filter: StorageFilter) -> Result<()> {
        self.allowed = if filter.is_empty() {
            None
        } else {
            let ids: Vec<i64> = self
                .topics
                .iter()
                .filter(|t| filter.should_include(&t.metadata.name))
                .map(|t| t.id)
                .collect();
            if ids.len() < filter.topics.len() {
                warn!(
                    requested = ?filter.topics,
                    matched = ids.len(),
                    "filter names topics absent from the recording"
                );
            }
            Some(ids)
        };
        // A prefetched row may not pass the new filter.
        self.pending = None;
        Ok(())
    }

    fn statistics(&self) -> Result<RecordingStats> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, COUNT(m.id), MIN(m.timestamp), MAX(m.timestamp) \
             FROM topics t LEFT JOIN messages m ON m.topic_id = t.id \
             GROUP BY t.id ORDER BY t.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?;

        let mut stats = RecordingStats::default();
        for row in rows {
            let (name, count, first, last) = row?;
            let count = u64::try_from(count).unwrap_or(0);
            stats.message_count += count;
            stats.topic_counts.push((name, count));
            if let Some(first) = first {
                stats.start_time_ns = Some(stats.start_time_ns.map_or(first, |t| t.min(first)));
            }
            if let Some(last) = last {
                stats.end_time_ns = Some(stats.end_time_ns.map_or(last, |t| t.max(last)));
            }
        }
        Ok(stats)
    }
}

/// Accept a `.db3` path or a bag directory containing exactly one `.db3`.
fn resolve_db_path(path: &Path) -> Result<PathBuf> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(BagError::open(display, "file does not exist"));
    }
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(path)
        .map_err(|e| BagError::open(&display, e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("db3"))
        .collect();
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(BagError::open(display, "directory contains no .db3 file")),
        n => Err(BagError::open(
            display,
            format!("directory contains {n} .db3 files, expected exactly one"),
        )),
    }
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

fn load_topics(conn: &Connection, has_definitions: bool) -> rusqlite::Result<Vec<TopicRow>> {
    // Bags older than Foxy have no QoS column.
    let qos_column = if column_names(conn, "topics")?
        .iter()
        .any(|c| c == "offered_qos_profiles")
    {
        "offered_qos_profiles"
    } else {
        "''"
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, type, serialization_format, {qos_column} FROM topics ORDER BY id"
    ))?;
    let mut topics = stmt
        .query_map([], |row| {
            Ok(TopicRow {
                id: row.get(0)?,
                metadata: TopicMetadata {
                    name: row.get(1)?,
                    type_name: row.get(2)?,
                    serialization_format: row.get(3)?,
                    offered_qos_profiles: row.get(4)?,
                    definition: None,
                },
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if has_definitions {
        let mut stmt = conn.prepare(
            "SELECT encoding, encoded_message_definition FROM message_definitions \
             WHERE topic_type = ?1",
        )?;
        for topic in &mut topics {
            let definition = stmt
                .query_row([&topic.metadata.type_name], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .optional()?;
            topic.metadata.definition = definition.filter(|(_, text)| !text.is_empty());
        }
    }
    Ok(topics)
}
