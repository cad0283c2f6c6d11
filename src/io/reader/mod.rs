// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record reader.
//!
//! [`BagReader`] turns the cursor-style "has next / read next" primitive of a
//! storage backend into a sequence of records. A record is an ordered
//! [`Fields`] mapping with three reserved keys first:
//!
//! - `topic`: topic the message was recorded on
//! - `time_ns`: receive timestamp in nanoseconds
//! - `type`: message type spec string
//!
//! followed by the message fields in declared order. Nested messages become
//! nested structs.
//!
//! Reading is forward-only. Once the cursor has advanced the only way back to
//! the start is [`BagReader::close`] followed by a new open.
//!
//! # Example
//!
//! ```rust,no_run
//! use bagrecord::BagReader;
//!
//! let mut reader = BagReader::open_path("recordings/talker")?;
//! println!("topics: {:?}", reader.topics()?);
//!
//! reader.set_filter(["/chatter"])?;
//! for record in reader.iter() {
//!     let record = record?;
//!     println!("{}", serde_json::to_string(&record).unwrap_or_default());
//! }
//! # Ok::<(), bagrecord::BagError>(())
//! ```

mod records;

pub use records::Records;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::config::ReaderOptions;
use crate::core::{BagError, CodecValue, Encoding, Fields, Result, TypeRegistry};
use crate::encoding::{CdrDeserializer, Deserializer};
use crate::io::filter::StorageFilter;
use crate::io::formats::open_cursor;
use crate::io::metadata::{
    ConverterOptions, RawEntry, RecordingStats, StorageKind, StorageOptions, TopicMetadata,
    TypeMap,
};
use crate::io::traits::SequentialCursor;
use crate::schema::parser::{parse_schema_with_encoding, SUPPORTED_ENCODINGS};
use crate::schema::{MessageSpec, MessageType, TypeDescriptor};

/// Record key holding the topic name.
pub const TOPIC_KEY: &str = "topic";
/// Record key holding the receive timestamp.
pub const TIME_KEY: &str = "time_ns";
/// Record key holding the message type.
pub const TYPE_KEY: &str = "type";

/// Keys every record starts with, in order.
pub const RESERVED_KEYS: [&str; 3] = [TOPIC_KEY, TIME_KEY, TYPE_KEY];

/// An open recording being read as records.
///
/// The reader owns exactly one cursor. It is not `Sync`; open a second reader
/// for parallel access to the same file.
pub struct BagReader {
    cursor: Option<Box<dyn SequentialCursor>>,
    /// Topic to type, fetched once per open
    type_map: TypeMap,
    registry: TypeRegistry,
    /// Registry entries displaced by embedded definitions, undone on close
    embedded: Vec<(String, Option<MessageType>)>,
    deserializer: CdrDeserializer,
    /// Resolved descriptors, per open
    descriptors: HashMap<String, TypeDescriptor>,
    /// Materialized records, set by the first `records()` call
    records: Option<Vec<Fields>>,
}

impl BagReader {
    /// Create a reader with no recording open.
    ///
    /// The type registry starts with the built-in message types.
    pub fn new() -> Result<Self> {
        Ok(Self {
            cursor: None,
            type_map: TypeMap::new(),
            registry: TypeRegistry::with_builtin_types()?,
            embedded: Vec::new(),
            deserializer: CdrDeserializer::new(),
            descriptors: HashMap::new(),
            records: None,
        })
    }

    /// Open a recording with the default storage (`sqlite3`) and
    /// serialization (`cdr`).
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = Self::new()?;
        reader.open(
            path,
            StorageKind::default().as_str(),
            Encoding::default().as_str(),
        )?;
        Ok(reader)
    }

    /// Open a recording described by `options`.
    ///
    /// Message search paths are registered before opening and the topic
    /// filter is installed after.
    pub fn with_options(options: ReaderOptions) -> Result<Self> {
        let mut reader = Self::new()?;
        for dir in &options.message_paths {
            reader.registry.register_search_path(dir.clone())?;
        }
        reader.open(
            &options.path,
            &options.storage_id,
            &options.serialization_format,
        )?;
        if !options.topics.is_empty() {
            reader.set_filter(options.topics.iter().cloned())?;
        }
        Ok(reader)
    }

    /// Type registry used to resolve message types.
    ///
    /// Types registered here are visible to the next record read.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Add a directory searched for `.msg` files of unregistered types.
    pub fn add_message_path(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        self.registry.register_search_path(dir)
    }

    /// Open a recording, replacing any recording already open.
    ///
    /// # Errors
    ///
    /// [`BagError::Open`] if the path does not exist, the storage identifier
    /// or serialization format is unknown, or the backend does not recognize
    /// the file.
    pub fn open(
        &mut self,
        path: impl AsRef<Path>,
        storage_id: &str,
        serialization_format: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        // The previous handle is dropped even if this open fails.
        self.close();

        if !path.exists() {
            return Err(BagError::open(path_str, "file does not exist"));
        }
        let converter = ConverterOptions::new(serialization_format);
        converter
            .encoding()
            .map_err(|e| BagError::open(&path_str, e.to_string()))?;

        let cursor = open_cursor(&StorageOptions::new(path, storage_id))?;
        let topics = cursor.topics_and_types()?;
        self.register_embedded_definitions(&topics);
        self.type_map = topics
            .iter()
            .map(|t| (t.name.clone(), t.type_name.clone()))
            .collect();

        debug!(
            path = %path_str,
            storage = %cursor.storage_kind(),
            serialization_format = %converter.input_serialization_format,
            topics = topics.len(),
            "opened recording"
        );
        self.cursor = Some(cursor);
        Ok(())
    }

    /// Close the recording. Later operations fail with [`BagError::NotOpen`].
    pub fn close(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            debug!(path = %cursor.path().display(), "closed recording");
        }
        if !self.embedded.is_empty() {
            let displaced = std::mem::take(&mut self.embedded);
            if let Err(e) = self.registry.restore(displaced) {
                warn!(error = %e, "failed to drop embedded definitions");
            }
        }
        self.type_map.clear();
        self.descriptors.clear();
        self.records = None;
    }

    /// Check whether a recording is open.
    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Path of the open storage file.
    pub fn path(&self) -> Option<&Path> {
        self.cursor.as_ref().map(|c| c.path())
    }

    fn cursor(&self) -> Result<&dyn SequentialCursor> {
        self.cursor.as_deref().ok_or(BagError::NotOpen)
    }

    fn cursor_mut(&mut self) -> Result<&mut Box<dyn SequentialCursor>> {
        self.cursor.as_mut().ok_or(BagError::NotOpen)
    }

    /// Topic metadata as the backend reports it.
    pub fn topics_and_types(&self) -> Result<Vec<TopicMetadata>> {
        self.cursor()?.topics_and_types()
    }

    /// Distinct topic names, in backend order.
    pub fn topics(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for topic in self.topics_and_types()? {
            if !names.contains(&topic.name) {
                names.push(topic.name);
            }
        }
        Ok(names)
    }

    /// Topic to type mapping, queried from the backend on every call.
    pub fn type_map(&self) -> Result<TypeMap> {
        Ok(self
            .topics_and_types()?
            .into_iter()
            .map(|t| (t.name, t.type_name))
            .collect())
    }

    /// Restrict subsequent reads to `topics`. An empty list removes the filter.
    pub fn set_filter<I, S>(&mut self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = StorageFilter::new(topics);
        let cursor = self.cursor_mut()?;
        if filter.is_empty() {
            debug!("removed topic filter");
            cursor.reset_filter()
        } else {
            debug!(topics = ?filter.topics, "installed topic filter");
            cursor.set_filter(filter)
        }
    }

    /// Message counts and time range of the whole recording.
    pub fn statistics(&self) -> Result<RecordingStats> {
        self.cursor()?.statistics()
    }

    /// All remaining records, read once and cached.
    ///
    /// The first call drains the cursor; later calls return the same slice
    /// without reading. Memory use grows with the recording, so prefer
    /// [`iter`](Self::iter) for large files.
    pub fn records(&mut self) -> Result<&[Fields]> {
        if self.records.is_none() {
            let mut records = Vec::new();
            while let Some(record) = self.read_next()? {
                records.push(record);
            }
            debug!(count = records.len(), "materialized records");
            self.records = Some(records);
        }
        Ok(self.records.as_deref().unwrap_or(&[]))
    }

    /// Iterate over the remaining records.
    pub fn iter(&mut self) -> Records<'_> {
        Records::new(self)
    }

    /// Read the next record, or `None` once the cursor is exhausted.
    ///
    /// An error aborts only the current record; the cursor has already moved
    /// past it.
    pub fn read_next(&mut self) -> Result<Option<Fields>> {
        let cursor = self.cursor_mut()?;
        if !cursor.has_next()? {
            return Ok(None);
        }
        let entry = cursor.read_next()?;
        self.decode_entry(entry).map(Some)
    }

    fn decode_entry(&mut self, entry: RawEntry) -> Result<Fields> {
        let type_name = match self.type_map.get(&entry.topic) {
            Some(type_name) => type_name.clone(),
            None => {
                error!(topic = %entry.topic, "entry topic missing from recording metadata");
                return Err(BagError::topic_resolution(entry.topic));
            }
        };

        let deserializer = self.deserializer;
        let descriptor = self.descriptor(&type_name)?;
        let fields = deserializer
            .to_fields(&entry.data, descriptor)
            .map_err(|e| BagError::deserialization(&entry.topic, &type_name, e))?;

        assemble_record(entry.topic, entry.time_ns, type_name, fields)
    }

    fn descriptor(&mut self, type_name: &str) -> Result<&TypeDescriptor> {
        if !self.descriptors.contains_key(type_name) {
            let descriptor = self.registry.resolve(type_name)?;
            self.descriptors.insert(type_name.to_string(), descriptor);
        }
        self.descriptors
            .get(type_name)
            .ok_or_else(|| BagError::type_resolution(type_name))
    }

    fn register_embedded_definitions(&mut self, topics: &[TopicMetadata]) {
        for topic in topics {
            let Some((encoding, text)) = &topic.definition else {
                continue;
            };
            if !SUPPORTED_ENCODINGS.contains(&encoding.to_lowercase().as_str()) {
                debug!(
                    type_name = %topic.type_name,
                    encoding = %encoding,
                    "skipping embedded definition"
                );
                continue;
            }
            let registered = MessageSpec::parse(&topic.type_name)
                .and_then(|spec| parse_schema_with_encoding(&spec.to_string(), text, encoding))
                .and_then(|schema| self.registry.overlay_schema(schema));
            match registered {
                Ok(displaced) => self.embedded.extend(displaced),
                Err(e) => {
                    warn!(
                        topic = %topic.name,
                        type_name = %topic.type_name,
                        error = %e,
                        "ignoring unusable embedded definition"
                    );
                }
            }
        }
    }
}

/// Build a record: reserved keys first, then the message fields.
fn assemble_record(
    topic: String,
    time_ns: i64,
    type_name: String,
    fields: Fields,
) -> Result<Fields> {
    if let Some(field) = fields.keys().find(|k| RESERVED_KEYS.contains(k)) {
        error!(
            topic = %topic,
            type_name = %type_name,
            field = %field,
            "message field collides with a reserved record key"
        );
        return Err(BagError::reserved_key_collision(topic, type_name, field));
    }

    let mut record = Fields::with_capacity(fields.len() + RESERVED_KEYS.len());
    record.insert(TOPIC_KEY, CodecValue::String(topic));
    record.insert(TIME_KEY, CodecValue::Int64(time_ns));
    record.insert(TYPE_KEY, CodecValue::String(type_name));
    for (name, value) in fields {
        record.insert(name, value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Cursor replaying a fixed list of entries.
    struct ScriptedCursor {
        path: PathBuf,
        topics: Vec<TopicMetadata>,
        entries: VecDeque<RawEntry>,
    }

    impl SequentialCursor for ScriptedCursor {
        fn storage_kind(&self) -> StorageKind {
            StorageKind::Sqlite3
        }

        fn path(&self) -> &Path {
            &self.path
        }

        fn has_next(&mut self) -> Result<bool> {
            Ok(!self.entries.is_empty())
        }

        fn read_next(&mut self) -> Result<RawEntry> {
            self.entries
                .pop_front()
                .ok_or_else(|| BagError::storage("scripted", "no more messages"))
        }

        fn topics_and_types(&self) -> Result<Vec<TopicMetadata>> {
            Ok(self.topics.clone())
        }

        fn set_filter(&mut self, filter: StorageFilter) -> Result<()> {
            self.entries.retain(|e| filter.should_include(&e.topic));
            Ok(())
        }

        fn statistics(&self) -> Result<RecordingStats> {
            Ok(RecordingStats::default())
        }
    }

    fn scripted_reader(entries: Vec<RawEntry>) -> BagReader {
        let topics = vec![TopicMetadata::new("/n", "std_msgs/msg/Int32")];
        let mut reader = BagReader::new().unwrap();
        reader.type_map = topics
            .iter()
            .map(|t| (t.name.clone(), t.type_name.clone()))
            .collect();
        reader.cursor = Some(Box::new(ScriptedCursor {
            path: PathBuf::from("scripted.db3"),
            topics,
            entries: entries.into(),
        }));
        reader
    }

    fn int32_payload(value: i32) -> Vec<u8> {
        let mut payload = vec![0x00, 0x01, 0x00, 0x00];
        payload.extend_from_slice(&value.to_le_bytes());
        payload
    }

    #[test]
    fn test_unknown_entry_topic_fails_only_that_record() {
        let mut reader = scripted_reader(vec![
            RawEntry::new("/ghost", int32_payload(1), 10),
            RawEntry::new("/n", int32_payload(7), 20),
        ]);

        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, BagError::TopicResolution { ref topic } if topic == "/ghost"));

        let record = reader.read_next().unwrap().unwrap();
        assert_eq!(record.get("data"), Some(&CodecValue::Int32(7)));
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_truncated_payload_is_deserialization_error() {
        let mut reader = scripted_reader(vec![
            RawEntry::new("/n", vec![0x00, 0x01, 0x00, 0x00, 0x2a], 10),
            RawEntry::new("/n", int32_payload(42), 20),
        ]);

        let results: Vec<Result<Fields>> = reader.iter().collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(BagError::Deserialization { ref topic, .. }) if topic == "/n"
        ));
        let record = results[1].as_ref().unwrap();
        assert_eq!(record.get("time_ns"), Some(&CodecValue::Int64(20)));
    }

    #[test]
    fn test_records_error_is_not_cached() {
        let mut reader = scripted_reader(vec![
            RawEntry::new("/n", int32_payload(1), 10),
            RawEntry::new("/ghost", int32_payload(2), 20),
            RawEntry::new("/n", int32_payload(3), 30),
        ]);

        assert!(reader.records().is_err());
        // The cursor moved past the bad entry; the rest is still readable.
        let records = reader.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("data"), Some(&CodecValue::Int32(3)));
    }

    #[test]
    fn test_assemble_record_order() {
        let fields: Fields = [("b", CodecValue::Int32(2)), ("a", CodecValue::Int32(1))]
            .into_iter()
            .collect();
        let record =
            assemble_record("/t".to_string(), 5, "pkg/msg/T".to_string(), fields).unwrap();
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["topic", "time_ns", "type", "b", "a"]);
        assert_eq!(record.get("time_ns"), Some(&CodecValue::Int64(5)));
    }

    #[test]
    fn test_assemble_record_empty_message() {
        let record =
            assemble_record("/e".to_string(), 1, "std_msgs/msg/Empty".to_string(), Fields::new())
                .unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("type").and_then(|v| v.as_str()), Some("std_msgs/msg/Empty"));
    }

    #[test]
    fn test_assemble_record_collision() {
        let fields: Fields = [("type", CodecValue::UInt8(1))].into_iter().collect();
        let err =
            assemble_record("/t".to_string(), 0, "pkg/msg/Bad".to_string(), fields).unwrap_err();
        assert!(matches!(
            err,
            BagError::ReservedKeyCollision { ref field, .. } if field == "type"
        ));
    }

    #[test]
    fn test_closed_reader_operations_fail() {
        let mut reader = BagReader::new().unwrap();
        assert!(!reader.is_open());
        assert!(matches!(reader.topics(), Err(BagError::NotOpen)));
        assert!(matches!(reader.type_map(), Err(BagError::NotOpen)));
        assert!(matches!(reader.set_filter(["/a"]), Err(BagError::NotOpen)));
        assert!(matches!(reader.read_next(), Err(BagError::NotOpen)));
        assert!(matches!(reader.records(), Err(BagError::NotOpen)));
    }

    #[test]
    fn test_open_missing_path() {
        let mut reader = BagReader::new().unwrap();
        let err = reader
            .open("/definitely/not/a/bag.db3", "sqlite3", "cdr")
            .unwrap_err();
        assert!(matches!(err, BagError::Open { .. }));
        assert!(!reader.is_open());
    }
}
