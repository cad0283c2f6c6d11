// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Recording writer.
//!
//! [`RecordingWriter`] creates a new recording on either backend. Messages
//! can be written as serialized payloads, or as [`Fields`] that are encoded
//! to CDR against the topic's type.
//!
//! # Example
//!
//! ```rust,no_run
//! use bagrecord::core::{CodecValue, Fields};
//! use bagrecord::io::metadata::{StorageKind, TopicMetadata};
//! use bagrecord::io::RecordingWriter;
//!
//! let mut writer = RecordingWriter::create("talker", StorageKind::Sqlite3)?;
//! writer.create_topic(&TopicMetadata::new("test", "example_interfaces/msg/String"))?;
//!
//! let message: Fields = [("data", CodecValue::from("Hello World!"))].into_iter().collect();
//! writer.write_message("test", &message, 1_000)?;
//! writer.finish()?;
//! # Ok::<(), bagrecord::BagError>(())
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::core::{BagError, Fields, Result, TypeRegistry};
use crate::encoding::to_payload;
use crate::io::formats::create_sink;
use crate::io::metadata::{StorageKind, TopicMetadata};
use crate::io::traits::RecordingSink;

/// Writer for a new recording.
pub struct RecordingWriter {
    inner: Box<dyn RecordingSink>,
    registry: TypeRegistry,
    /// Topic to type, for encoding messages
    topic_types: HashMap<String, String>,
}

impl RecordingWriter {
    /// Create a recording with the given backend.
    ///
    /// `path` names the storage file or a bag directory to create it in.
    pub fn create(path: impl AsRef<Path>, kind: StorageKind) -> Result<Self> {
        Ok(Self {
            inner: create_sink(path.as_ref(), kind)?,
            registry: TypeRegistry::with_builtin_types()?,
            topic_types: HashMap::new(),
        })
    }

    /// Create a recording, picking the backend from the file extension.
    ///
    /// `.mcap` selects MCAP; anything else writes rosbag2 SQLite.
    pub fn create_auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let kind = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext == StorageKind::Mcap.extension() => StorageKind::Mcap,
            _ => StorageKind::Sqlite3,
        };
        Self::create(path, kind)
    }

    /// Type registry used by [`write_message`](Self::write_message).
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Backend being written.
    pub fn storage_kind(&self) -> StorageKind {
        self.inner.storage_kind()
    }

    /// Path of the storage file.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Declare a topic.
    ///
    /// An embedded definition is also registered, so messages of that type
    /// can be written with [`write_message`](Self::write_message).
    pub fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        if let Some((_, text)) = &topic.definition {
            self.registry.register_definition(&topic.type_name, text)?;
        }
        self.inner.create_topic(topic)?;
        self.topic_types
            .insert(topic.name.clone(), topic.type_name.clone());
        Ok(())
    }

    /// Append a serialized message.
    pub fn write(&mut self, topic: &str, data: &[u8], time_ns: i64) -> Result<()> {
        self.inner.write(topic, data, time_ns)
    }

    /// Encode `message` as CDR for the topic's type and append it.
    pub fn write_message(&mut self, topic: &str, message: &Fields, time_ns: i64) -> Result<()> {
        let type_name = self
            .topic_types
            .get(topic)
            .ok_or_else(|| BagError::topic_resolution(topic))?;
        let payload = to_payload(message, type_name, &self.registry)?;
        self.inner.write(topic, &payload, time_ns)
    }

    /// Flush and close the recording.
    pub fn finish(&mut self) -> Result<()> {
        self.inner.finish()
    }

    /// Get the number of messages written.
    pub fn message_count(&self) -> u64 {
        self.inner.message_count()
    }

    /// Get the number of topics declared.
    pub fn topic_count(&self) -> usize {
        self.inner.topic_count()
    }
}
