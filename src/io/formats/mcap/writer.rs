// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP writer for ROS 2 recordings.
//!
//! Schemas and channels go into the data section as topics are created.
//! Messages are buffered and written as compressed chunks. [`finish`] writes
//! the summary section (schemas, channels, statistics, chunk indexes) and the
//! footer, so the output is readable by both linear and indexed readers.
//!
//! [`finish`]: RecordingSink::finish

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, info, warn};

use crate::core::{BagError, Result};
use crate::io::formats::mcap::constants::{
    COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_ZSTD, MCAP_MAGIC, OP_CHANNEL, OP_CHUNK,
    OP_CHUNK_INDEX, OP_DATA_END, OP_FOOTER, OP_HEADER, OP_MESSAGE, OP_SCHEMA, OP_STATISTICS,
    PROFILE_ROS2, QOS_METADATA_KEY, SCHEMA_ENCODING_ROS2MSG,
};
use crate::io::metadata::{StorageKind, TopicMetadata};
use crate::io::traits::RecordingSink;

/// Default target chunk size (uncompressed).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

const ZSTD_LEVEL: i32 = 3;

/// Compression applied to chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkCompression {
    /// Store chunk records as-is
    None,
    /// Zstandard
    #[default]
    Zstd,
    /// LZ4 frame format
    Lz4,
}

impl ChunkCompression {
    /// Identifier stored in the chunk record.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkCompression::None => COMPRESSION_NONE,
            ChunkCompression::Zstd => COMPRESSION_ZSTD,
            ChunkCompression::Lz4 => COMPRESSION_LZ4,
        }
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            ChunkCompression::None => Ok(data.to_vec()),
            ChunkCompression::Zstd => zstd::bulk::compress(data, ZSTD_LEVEL)
                .map_err(|e| BagError::storage("mcap", format!("zstd compression failed: {e}"))),
            ChunkCompression::Lz4 => {
                let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
                encoder.write_all(data)?;
                encoder
                    .finish()
                    .map_err(|e| BagError::storage("mcap", format!("lz4 compression failed: {e}")))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct SchemaRecord {
    id: u16,
    name: String,
    encoding: String,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ChannelRecord {
    id: u16,
    schema_id: u16,
    topic: String,
    message_encoding: String,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct ChunkIndexRecord {
    message_start_time: u64,
    message_end_time: u64,
    chunk_start_offset: u64,
    chunk_length: u64,
    compressed_size: u64,
    uncompressed_size: u64,
}

/// Message records waiting to be written as one chunk.
#[derive(Debug, Default)]
struct ChunkBuffer {
    records: Vec<u8>,
    start_time: u64,
    end_time: u64,
    message_count: usize,
}

/// Writer for `.mcap` recordings.
pub struct McapWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// Bytes written so far
    position: u64,
    compression: ChunkCompression,
    chunk_size: usize,

    schemas: Vec<SchemaRecord>,
    schema_ids: HashMap<String, u16>,
    channels: Vec<ChannelRecord>,
    channel_ids: HashMap<String, u16>,
    sequences: HashMap<u16, u32>,
    channel_message_counts: BTreeMap<u16, u64>,

    chunk: ChunkBuffer,
    chunk_indexes: Vec<ChunkIndexRecord>,

    message_count: u64,
    start_time: u64,
    end_time: u64,
    finished: bool,
}

impl McapWriter {
    /// Create a new recording with zstd chunks.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, ChunkCompression::default(), DEFAULT_CHUNK_SIZE)
    }

    /// Create a new recording with the given chunk compression and size.
    ///
    /// `path` may name the `.mcap` file, or a directory (created if needed)
    /// in which `<dirname>_0.mcap` is written. Refuses to overwrite.
    pub fn with_options(
        path: impl AsRef<Path>,
        compression: ChunkCompression,
        chunk_size: usize,
    ) -> Result<Self> {
        let path = mcap_path_for(path.as_ref())?;
        if path.exists() {
            return Err(BagError::open(
                path.display().to_string(),
                "recording already exists",
            ));
        }
        let file = File::create(&path)
            .map_err(|e| BagError::open(path.display().to_string(), e.to_string()))?;

        let mut writer = Self {
            path,
            writer: BufWriter::new(file),
            position: 0,
            compression,
            chunk_size: chunk_size.max(1),
            schemas: Vec::new(),
            schema_ids: HashMap::new(),
            channels: Vec::new(),
            channel_ids: HashMap::new(),
            sequences: HashMap::new(),
            channel_message_counts: BTreeMap::new(),
            chunk: ChunkBuffer::default(),
            chunk_indexes: Vec::new(),
            message_count: 0,
            start_time: u64::MAX,
            end_time: 0,
            finished: false,
        };
        writer.write_header()?;
        info!(
            path = %writer.path.display(),
            compression = writer.compression.as_str(),
            "created mcap recording"
        );
        Ok(writer)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.position += data.len() as u64;
        Ok(())
    }

    /// Write opcode, length and body.
    fn write_record(&mut self, opcode: u8, body: &[u8]) -> Result<()> {
        let mut prefix = Vec::with_capacity(9);
        prefix.write_u8(opcode)?;
        prefix.write_u64::<LittleEndian>(body.len() as u64)?;
        self.write_bytes(&prefix)?;
        self.write_bytes(body)
    }

    fn write_header(&mut self) -> Result<()> {
        self.write_bytes(&MCAP_MAGIC)?;
        let mut body = Vec::new();
        put_str(&mut body, PROFILE_ROS2)?;
        put_str(&mut body, env!("CARGO_PKG_NAME"))?;
        self.write_record(OP_HEADER, &body)
    }

    fn add_schema(&mut self, name: &str, encoding: &str, data: &[u8]) -> Result<u16> {
        if let Some(&id) = self.schema_ids.get(name) {
            return Ok(id);
        }
        // Schema id 0 means "no schema".
        let id = u16::try_from(self.schemas.len() + 1)
            .map_err(|_| BagError::storage("mcap", "too many schemas"))?;
        let record = SchemaRecord {
            id,
            name: name.to_string(),
            encoding: encoding.to_string(),
            data: data.to_vec(),
        };
        self.write_record(OP_SCHEMA, &schema_body(&record)?)?;
        self.schemas.push(record);
        self.schema_ids.insert(name.to_string(), id);
        Ok(id)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(BagError::storage("mcap", "writer already finished"));
        }
        Ok(())
    }

    /// Write buffered messages as one chunk.
    fn flush_chunk(&mut self) -> Result<()> {
        if self.chunk.message_count == 0 {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.chunk);
        let compressed = self.compression.compress(&chunk.records)?;
        let crc = crc32fast::hash(&chunk.records);

        let mut body = Vec::with_capacity(compressed.len() + 64);
        body.write_u64::<LittleEndian>(chunk.start_time)?;
        body.write_u64::<LittleEndian>(chunk.end_time)?;
        body.write_u64::<LittleEndian>(chunk.records.len() as u64)?;
        body.write_u32::<LittleEndian>(crc)?;
        put_str(&mut body, self.compression.as_str())?;
        body.write_u64::<LittleEndian>(compressed.len() as u64)?;
        body.extend_from_slice(&compressed);

        let chunk_start_offset = self.position;
        self.write_record(OP_CHUNK, &body)?;
        self.chunk_indexes.push(ChunkIndexRecord {
            message_start_time: chunk.start_time,
            message_end_time: chunk.end_time,
            chunk_start_offset,
            chunk_length: self.position - chunk_start_offset,
            compressed_size: compressed.len() as u64,
            uncompressed_size: chunk.records.len() as u64,
        });
        debug!(
            messages = chunk.message_count,
            uncompressed = chunk.records.len(),
            compressed = compressed.len(),
            "wrote chunk"
        );
        Ok(())
    }

    fn write_summary(&mut self) -> Result<u64> {
        let summary_start = self.position;

        for schema in self.schemas.clone() {
            self.write_record(OP_SCHEMA, &schema_body(&schema)?)?;
        }
        for channel in self.channels.clone() {
            self.write_record(OP_CHANNEL, &channel_body(&channel)?)?;
        }

        let mut stats = Vec::new();
        stats.write_u64::<LittleEndian>(self.message_count)?;
        stats.write_u16::<LittleEndian>(self.schemas.len() as u16)?;
        stats.write_u32::<LittleEndian>(self.channels.len() as u32)?;
        stats.write_u32::<LittleEndian>(0)?; // attachments
        stats.write_u32::<LittleEndian>(0)?; // metadata
        stats.write_u32::<LittleEndian>(self.chunk_indexes.len() as u32)?;
        let (start, end) = if self.message_count > 0 {
            (self.start_time, self.end_time)
        } else {
            (0, 0)
        };
        stats.write_u64::<LittleEndian>(start)?;
        stats.write_u64::<LittleEndian>(end)?;
        stats.write_u32::<LittleEndian>((self.channel_message_counts.len() * 10) as u32)?;
        for (&channel_id, &count) in &self.channel_message_counts {
            stats.write_u16::<LittleEndian>(channel_id)?;
            stats.write_u64::<LittleEndian>(count)?;
        }
        self.write_record(OP_STATISTICS, &stats)?;

        for index in self.chunk_indexes.clone() {
            let mut body = Vec::new();
            body.write_u64::<LittleEndian>(index.message_start_time)?;
            body.write_u64::<LittleEndian>(index.message_end_time)?;
            body.write_u64::<LittleEndian>(index.chunk_start_offset)?;
            body.write_u64::<LittleEndian>(index.chunk_length)?;
            body.write_u32::<LittleEndian>(0)?; // no message index offsets
            body.write_u64::<LittleEndian>(0)?; // message index length
            put_str(&mut body, self.compression.as_str())?;
            body.write_u64::<LittleEndian>(index.compressed_size)?;
            body.write_u64::<LittleEndian>(index.uncompressed_size)?;
            self.write_record(OP_CHUNK_INDEX, &body)?;
        }

        Ok(summary_start)
    }
}

impl RecordingSink for McapWriter {
    fn storage_kind(&self) -> StorageKind {
        StorageKind::Mcap
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        self.ensure_open()?;
        if self.channel_ids.contains_key(&topic.name) {
            return Ok(());
        }

        let (encoding, text) = match &topic.definition {
            Some((encoding, text)) => (encoding.as_str(), text.as_str()),
            None => (SCHEMA_ENCODING_ROS2MSG, ""),
        };
        let schema_id = self.add_schema(&topic.type_name, encoding, text.as_bytes())?;

        let id = u16::try_from(self.channels.len())
            .map_err(|_| BagError::storage("mcap", "too many channels"))?;
        let mut metadata = BTreeMap::new();
        if !topic.offered_qos_profiles.is_empty() {
            metadata.insert(
                QOS_METADATA_KEY.to_string(),
                topic.offered_qos_profiles.clone(),
            );
        }
        let record = ChannelRecord {
            id,
            schema_id,
            topic: topic.name.clone(),
            message_encoding: topic.serialization_format.clone(),
            metadata,
        };
        self.write_record(OP_CHANNEL, &channel_body(&record)?)?;
        self.channels.push(record);
        self.channel_ids.insert(topic.name.clone(), id);
        self.sequences.insert(id, 0);
        debug!(topic = %topic.name, type_name = %topic.type_name, id, "created channel");
        Ok(())
    }

    fn write(&mut self, topic: &str, data: &[u8], time_ns: i64) -> Result<()> {
        self.ensure_open()?;
        let channel_id = *self
            .channel_ids
            .get(topic)
            .ok_or_else(|| BagError::topic_resolution(topic))?;
        let log_time = u64::try_from(time_ns).map_err(|_| {
            BagError::storage("mcap", format!("negative timestamp {time_ns} on '{topic}'"))
        })?;

        let sequence = self.sequences.entry(channel_id).or_insert(0);
        let current = *sequence;
        *sequence = sequence.wrapping_add(1);

        let records = &mut self.chunk.records;
        records.write_u8(OP_MESSAGE)?;
        records.write_u64::<LittleEndian>((2 + 4 + 8 + 8 + data.len()) as u64)?;
        records.write_u16::<LittleEndian>(channel_id)?;
        records.write_u32::<LittleEndian>(current)?;
        records.write_u64::<LittleEndian>(log_time)?;
        records.write_u64::<LittleEndian>(log_time)?;
        records.extend_from_slice(data);

        if self.chunk.message_count == 0 {
            self.chunk.start_time = log_time;
            self.chunk.end_time = log_time;
        } else {
            self.chunk.start_time = self.chunk.start_time.min(log_time);
            self.chunk.end_time = self.chunk.end_time.max(log_time);
        }
        self.chunk.message_count += 1;

        *self.channel_message_counts.entry(channel_id).or_insert(0) += 1;
        self.message_count += 1;
        self.start_time = self.start_time.min(log_time);
        self.end_time = self.end_time.max(log_time);

        if self.chunk.records.len() >= self.chunk_size {
            self.flush_chunk()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.flush_chunk()?;

        let mut data_end = Vec::new();
        data_end.write_u32::<LittleEndian>(0)?; // no data section crc
        self.write_record(OP_DATA_END, &data_end)?;

        let summary_start = self.write_summary()?;

        let mut footer = Vec::new();
        footer.write_u64::<LittleEndian>(summary_start)?;
        footer.write_u64::<LittleEndian>(0)?; // no summary offset section
        footer.write_u32::<LittleEndian>(0)?; // no summary crc
        self.write_record(OP_FOOTER, &footer)?;
        self.write_bytes(&MCAP_MAGIC)?;
        self.writer.flush()?;

        self.finished = true;
        info!(
            path = %self.path.display(),
            messages = self.message_count,
            chunks = self.chunk_indexes.len(),
            "finished mcap recording"
        );
        Ok(())
    }

    fn message_count(&self) -> u64 {
        self.message_count
    }

    fn topic_count(&self) -> usize {
        self.channels.len()
    }
}

impl Drop for McapWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish() {
                warn!(path = %self.path.display(), error = %e, "failed to finish recording on drop");
            }
        }
    }
}

fn put_str(buf: &mut Vec<u8>, value: &str) -> Result<()> {
    buf.write_u32::<LittleEndian>(value.len() as u32)?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn schema_body(schema: &SchemaRecord) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_u16::<LittleEndian>(schema.id)?;
    put_str(&mut body, &schema.name)?;
    put_str(&mut body, &schema.encoding)?;
    body.write_u32::<LittleEndian>(schema.data.len() as u32)?;
    body.extend_from_slice(&schema.data);
    Ok(body)
}

fn channel_body(channel: &ChannelRecord) -> Result<Vec<u8>> {
    let mut metadata = Vec::new();
    for (key, value) in &channel.metadata {
        put_str(&mut metadata, key)?;
        put_str(&mut metadata, value)?;
    }

    let mut body = Vec::new();
    body.write_u16::<LittleEndian>(channel.id)?;
    body.write_u16::<LittleEndian>(channel.schema_id)?;
    put_str(&mut body, &channel.topic)?;
    put_str(&mut body, &channel.message_encoding)?;
    body.write_u32::<LittleEndian>(metadata.len() as u32)?;
    body.extend_from_slice(&metadata);
    Ok(body)
}

fn mcap_path_for(path: &Path) -> Result<PathBuf> {
    if path.extension().and_then(|e| e.to_str()) == Some("mcap") {
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
    Ok(path.join(format!("{stem}_0.mcap")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::mcap::McapCursor;
    use crate::io::traits::SequentialCursor;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bagrecord_mcap_{}_{}", std::process::id(), name))
    }

    fn write_sample(path: &Path, compression: ChunkCompression, chunk_size: usize) {
        let mut writer = McapWriter::with_options(path, compression, chunk_size).unwrap();
        writer
            .create_topic(
                &TopicMetadata::new("/a", "my_pkg/msg/Num").with_definition("ros2msg", "int32 n\n"),
            )
            .unwrap();
        writer
            .create_topic(&TopicMetadata::new("/b", "std_msgs/msg/Int32").with_qos_profiles("qos"))
            .unwrap();
        writer.write("/a", &[1], 30).unwrap();
        writer.write("/b", &[2], 10).unwrap();
        writer.write("/a", &[3], 20).unwrap();
        writer.finish().unwrap();
    }

    fn drain(cursor: &mut McapCursor) -> Vec<(i64, String, u8)> {
        let mut seen = Vec::new();
        while cursor.has_next().unwrap() {
            let entry = cursor.read_next().unwrap();
            seen.push((entry.time_ns, entry.topic, entry.data[0]));
        }
        seen
    }

    #[test]
    fn test_round_trip_each_compression() {
        for (name, compression) in [
            ("none.mcap", ChunkCompression::None),
            ("zstd.mcap", ChunkCompression::Zstd),
            ("lz4.mcap", ChunkCompression::Lz4),
        ] {
            let path = temp_path(name);
            let _ = std::fs::remove_file(&path);
            write_sample(&path, compression, DEFAULT_CHUNK_SIZE);

            let mut cursor = McapCursor::open(&path).unwrap();
            assert_eq!(
                drain(&mut cursor),
                vec![
                    (10, "/b".to_string(), 2),
                    (20, "/a".to_string(), 3),
                    (30, "/a".to_string(), 1),
                ]
            );
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn test_one_message_per_chunk() {
        let path = temp_path("small_chunks.mcap");
        let _ = std::fs::remove_file(&path);
        write_sample(&path, ChunkCompression::Zstd, 1);

        let mut cursor = McapCursor::open(&path).unwrap();
        assert_eq!(drain(&mut cursor).len(), 3);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_topics_from_summary() {
        let path = temp_path("topics.mcap");
        let _ = std::fs::remove_file(&path);
        write_sample(&path, ChunkCompression::Zstd, DEFAULT_CHUNK_SIZE);

        let cursor = McapCursor::open(&path).unwrap();
        let topics = cursor.topics_and_types().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].name, "/a");
        assert_eq!(topics[0].type_name, "my_pkg/msg/Num");
        assert_eq!(
            topics[0].definition,
            Some(("ros2msg".to_string(), "int32 n\n".to_string()))
        );
        assert_eq!(topics[1].offered_qos_profiles, "qos");
        assert_eq!(topics[1].definition, None);

        let stats = cursor.statistics().unwrap();
        assert_eq!(stats.message_count, 3);
        assert_eq!(stats.start_time_ns, Some(10));
        assert_eq!(stats.end_time_ns, Some(30));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let path = temp_path("negative.mcap");
        let _ = std::fs::remove_file(&path);
        let mut writer = McapWriter::create(&path).unwrap();
        writer
            .create_topic(&TopicMetadata::new("/a", "std_msgs/msg/Int32"))
            .unwrap();
        assert!(writer.write("/a", &[0], -1).is_err());
        writer.finish().unwrap();
        drop(writer);
        let _ = std::fs::remove_file(&path);
    }
}
