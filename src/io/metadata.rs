// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shared metadata types for recordings.
//!
//! These types are common to every storage backend: the topic table, the raw
//! entries a cursor yields, and the options a recording is opened with.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::{BagError, Encoding, Result};

/// Topic name to message type name.
pub type TypeMap = HashMap<String, String>;

/// MCAP file magic.
pub const MCAP_MAGIC: &[u8; 8] = b"\x89MCAP0\r\n";

/// SQLite database file magic.
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Information about a topic in a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMetadata {
    /// Topic name (e.g., "/chatter")
    pub name: String,
    /// Message type spec string (e.g., "std_msgs/msg/String")
    pub type_name: String,
    /// Serialization format of the payloads (e.g., "cdr")
    pub serialization_format: String,
    /// QoS profiles the topic was offered with, as stored by the recorder
    pub offered_qos_profiles: String,
    /// Embedded definition: (schema encoding, text)
    pub definition: Option<(String, String)>,
}

impl TopicMetadata {
    /// Create topic metadata with CDR serialization and no embedded definition.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            serialization_format: Encoding::Cdr.as_str().to_string(),
            offered_qos_profiles: String::new(),
            definition: None,
        }
    }

    /// Set the serialization format.
    pub fn with_serialization_format(mut self, format: impl Into<String>) -> Self {
        self.serialization_format = format.into();
        self
    }

    /// Set the offered QoS profiles.
    pub fn with_qos_profiles(mut self, profiles: impl Into<String>) -> Self {
        self.offered_qos_profiles = profiles.into();
        self
    }

    /// Attach an embedded definition.
    pub fn with_definition(mut self, encoding: impl Into<String>, text: impl Into<String>) -> Self {
        self.definition = Some((encoding.into(), text.into()));
        self
    }
}

/// One serialized message as stored: transient, consumed by the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    /// Topic the message was recorded on
    pub topic: String,
    /// Serialized payload
    pub data: Vec<u8>,
    /// Receive timestamp (nanoseconds since Unix epoch)
    pub time_ns: i64,
}

impl RawEntry {
    /// Create a new entry.
    pub fn new(topic: impl Into<String>, data: Vec<u8>, time_ns: i64) -> Self {
        Self {
            topic: topic.into(),
            data,
            time_ns,
        }
    }

    /// Get the data length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the entry has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Message counts and time range of a recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingStats {
    /// Total number of messages
    pub message_count: u64,
    /// Per-topic counts, in topic order
    pub topic_counts: Vec<(String, u64)>,
    /// Earliest timestamp (nanoseconds)
    pub start_time_ns: Option<i64>,
    /// Latest timestamp (nanoseconds)
    pub end_time_ns: Option<i64>,
}

impl RecordingStats {
    /// Get the duration in nanoseconds.
    pub fn duration_ns(&self) -> i64 {
        match (self.start_time_ns, self.end_time_ns) {
            (Some(s), Some(e)) if e > s => e - s,
            _ => 0,
        }
    }

    /// Count one message.
    pub(crate) fn record(&mut self, topic: &str, time_ns: i64) {
        self.message_count += 1;
        match self.topic_counts.iter_mut().find(|(name, _)| name == topic) {
            Some((_, count)) => *count += 1,
            None => self.topic_counts.push((topic.to_string(), 1)),
        }
        self.start_time_ns = Some(self.start_time_ns.map_or(time_ns, |t| t.min(time_ns)));
        self.end_time_ns = Some(self.end_time_ns.map_or(time_ns, |t| t.max(time_ns)));
    }
}

/// Storage backend of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageKind {
    /// rosbag2 SQLite database (`.db3`)
    #[default]
    Sqlite3,
    /// MCAP container
    Mcap,
}

impl StorageKind {
    /// All supported storage identifiers.
    pub const ALL: [StorageKind; 2] = [StorageKind::Sqlite3, StorageKind::Mcap];

    /// Storage identifier as used by rosbag2.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Sqlite3 => "sqlite3",
            StorageKind::Mcap => "mcap",
        }
    }

    /// File extension of recordings written by this backend.
    pub fn extension(&self) -> &'static str {
        match self {
            StorageKind::Sqlite3 => "db3",
            StorageKind::Mcap => "mcap",
        }
    }

    /// Detect the backend from file magic, falling back to the extension.
    ///
    /// Returns `None` if neither identifies a supported backend.
    pub fn detect(path: &Path) -> Option<Self> {
        if let Ok(mut file) = File::open(path) {
            let mut header = [0u8; 16];
            if let Ok(n) = file.read(&mut header) {
                if n >= MCAP_MAGIC.len() && header[..MCAP_MAGIC.len()] == MCAP_MAGIC[..] {
                    return Some(StorageKind::Mcap);
                }
                if n == SQLITE_MAGIC.len() && header == *SQLITE_MAGIC {
                    return Some(StorageKind::Sqlite3);
                }
            }
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("db3") => Some(StorageKind::Sqlite3),
            Some("mcap") => Some(StorageKind::Mcap),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = BagError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sqlite3" => Ok(StorageKind::Sqlite3),
            "mcap" => Ok(StorageKind::Mcap),
            other => Err(BagError::Config(format!(
                "unknown storage id '{other}', expected one of: sqlite3, mcap"
            ))),
        }
    }
}

/// Where and how a recording is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageOptions {
    /// Path of the recording (file or bag directory)
    pub uri: PathBuf,
    /// Storage backend identifier
    pub storage_id: String,
}

impl StorageOptions {
    /// Create storage options.
    pub fn new(uri: impl Into<PathBuf>, storage_id: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            storage_id: storage_id.into(),
        }
    }

    /// Parse the storage identifier.
    pub fn kind(&self) -> Result<StorageKind> {
        self.storage_id.parse()
    }
}

/// Serialization formats on either side of the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterOptions {
    /// Format the payloads are stored in
    pub input_serialization_format: String,
    /// Format handed to the deserializer
    pub output_serialization_format: String,
}

impl ConverterOptions {
    /// Same format on both sides, as the reader uses it.
    pub fn new(serialization_format: impl Into<String>) -> Self {
        let format = serialization_format.into();
        Self {
            input_serialization_format: format.clone(),
            output_serialization_format: format,
        }
    }

    /// Parse the input format.
    pub fn encoding(&self) -> Result<Encoding> {
        self.input_serialization_format
            .parse()
            .map_err(|e: crate::core::ParseEncodingError| BagError::Config(e.to_string()))
    }
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self::new(Encoding::Cdr.as_str())
    }
}
