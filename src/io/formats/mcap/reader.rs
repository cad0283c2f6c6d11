// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential MCAP cursor.
//!
//! On open the file is memory-mapped and walked once. Schemas and channels
//! are collected, and every message record gets an index entry holding its
//! log time and location (top level, or inside a chunk). The index is sorted
//! by log time, so messages come out in timestamp order even when chunks
//! overlap. Payloads are copied out only when read.
//!
//! Topic metadata is taken from the summary section when the file has one,
//! falling back to the channels seen while walking.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use crate::core::{BagError, Result};
use crate::io::filter::StorageFilter;
use crate::io::formats::mcap::constants::{
    COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_ZSTD, MCAP_MAGIC, OP_CHANNEL, OP_CHUNK,
    OP_DATA_END, OP_FOOTER, OP_MESSAGE, OP_SCHEMA, QOS_METADATA_KEY,
};
use crate::io::metadata::{RawEntry, RecordingStats, StorageKind, TopicMetadata};
use crate::io::traits::SequentialCursor;

/// Opcode plus record length.
const RECORD_PREFIX_LEN: usize = 9;

/// channel_id + sequence + log_time + publish_time
const MESSAGE_HEADER_LEN: usize = 2 + 4 + 8 + 8;

#[derive(Debug, Clone)]
struct SchemaInfo {
    name: String,
    encoding: String,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ChannelInfo {
    topic: String,
    schema_id: u16,
    message_encoding: String,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct ChunkInfo {
    /// Compressed records, as a range of the file
    start: usize,
    end: usize,
    compression: String,
    uncompressed_size: usize,
    uncompressed_crc: u32,
}

/// Where a message payload lives.
#[derive(Debug, Clone, Copy)]
enum Location {
    /// Range of the file
    File { start: usize, end: usize },
    /// Range of a decompressed chunk
    Chunk {
        chunk: usize,
        start: usize,
        end: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct MessageRef {
    log_time: u64,
    channel_id: u16,
    location: Location,
}

/// State collected during the open-time walk.
#[derive(Default)]
struct Scan {
    schemas: HashMap<u16, SchemaInfo>,
    channels: BTreeMap<u16, ChannelInfo>,
    chunks: Vec<ChunkInfo>,
    index: Vec<MessageRef>,
}

/// Cursor over a `.mcap` file.
pub struct McapCursor {
    path: PathBuf,
    mmap: memmap2::Mmap,
    topics: Vec<TopicMetadata>,
    channels: BTreeMap<u16, ChannelInfo>,
    chunks: Vec<ChunkInfo>,
    index: Vec<MessageRef>,
    /// Channels allowed by the filter; `None` = all
    allowed: Option<HashSet<u16>>,
    /// Next index entry to consider
    next: usize,
    /// Most recently decompressed chunk
    cached_chunk: Option<(usize, Vec<u8>)>,
}

impl McapCursor {
    /// Open an MCAP file (or a bag directory holding exactly one).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let requested = path.as_ref();
        let display = requested.display().to_string();
        let file_path = resolve_mcap_path(requested)?;

        let file = File::open(&file_path).map_err(|e| BagError::open(&display, e.to_string()))?;
        // SAFETY: the map is read-only and recordings are not modified while open.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| BagError::open(&display, format!("failed to mmap file: {e}")))?;

        if mmap.len() < MCAP_MAGIC.len() || mmap[..MCAP_MAGIC.len()] != MCAP_MAGIC {
            return Err(BagError::open(&display, "not an MCAP file (bad magic)"));
        }

        let mut scan = Scan::default();
        scan_records(&mmap, MCAP_MAGIC.len(), None, &mut scan)
            .map_err(|e| BagError::open(&display, e.to_string()))?;
        scan.index.sort_by_key(|m| m.log_time);

        let topics = match mcap::Summary::read(&mmap) {
            Ok(Some(summary)) => {
                let mut channels: Vec<_> = summary.channels.values().collect();
                channels.sort_by_key(|c| c.id);
                let mut topics: Vec<TopicMetadata> = Vec::with_capacity(channels.len());
                for channel in channels {
                    if topics.iter().any(|t| t.name == channel.topic) {
                        continue;
                    }
                    let schema = channel.schema.as_ref();
                    let mut topic = TopicMetadata::new(
                        channel.topic.clone(),
                        schema.map(|s| s.name.clone()).unwrap_or_default(),
                    )
                    .with_serialization_format(channel.message_encoding.clone())
                    .with_qos_profiles(
                        channel
                            .metadata
                            .get(QOS_METADATA_KEY)
                            .cloned()
                            .unwrap_or_default(),
                    );
                    if let Some(schema) = schema.filter(|s| !s.data.is_empty()) {
                        topic = topic.with_definition(
                            schema.encoding.clone(),
                            String::from_utf8_lossy(&schema.data).into_owned(),
                        );
                    }
                    topics.push(topic);
                }
                topics
            }
            Ok(None) => {
                debug!(path = %file_path.display(), "no summary section, using scanned channels");
                topics_from_scan(&scan)
            }
            Err(e) => {
                warn!(
                    path = %file_path.display(),
                    error = %e,
                    "failed to read summary, using scanned channels"
                );
                topics_from_scan(&scan)
            }
        };

        debug!(
            path = %file_path.display(),
            topics = topics.len(),
            messages = scan.index.len(),
            chunks = scan.chunks.len(),
            "opened mcap recording"
        );

        Ok(Self {
            path: file_path,
            mmap,
            topics,
            channels: scan.channels,
            chunks: scan.chunks,
            index: scan.index,
            allowed: None,
            next: 0,
            cached_chunk: None,
        })
    }

    fn is_allowed(&self, message: &MessageRef) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |ids| ids.contains(&message.channel_id))
    }

    fn payload(&mut self, location: Location) -> Result<Vec<u8>> {
        match location {
            Location::File { start, end } => Ok(self.mmap[start..end].to_vec()),
            Location::Chunk { chunk, start, end } => {
                let hit = matches!(&self.cached_chunk, Some((cached, _)) if *cached == chunk);
                if !hit {
                    let info = self.chunks.get(chunk).ok_or_else(|| {
                        BagError::storage("mcap", format!("missing chunk {chunk}"))
                    })?;
                    let records = decompress_chunk(info, &self.mmap[info.start..info.end])?;
                    self.cached_chunk = Some((chunk, records));
                }
                match &self.cached_chunk {
                    Some((_, records)) if end <= records.len() => Ok(records[start..end].to_vec()),
                    _ => Err(BagError::storage("mcap", "message outside its chunk")),
                }
            }
        }
    }
}

impl SequentialCursor for McapCursor {
    fn storage_kind(&self) -> StorageKind {
        StorageKind::Mcap
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn has_next(&mut self) -> Result<bool> {
        while self.next < self.index.len() && !self.is_allowed(&self.index[self.next]) {
            self.next += 1;
        }
        Ok(self.next < self.index.len())
    }

    fn read_next(&mut self) -> Result<RawEntry> {
        if !self.has_next()? {
            return Err(BagError::storage("mcap", "no more messages"));
        }
        let message = self.index[self.next];
        self.next += 1;

        let topic = self
            .channels
            .get(&message.channel_id)
            .map(|c| c.topic.clone())
            .ok_or_else(|| {
                BagError::storage(
                    "mcap",
                    format!("message references unknown channel {}", message.channel_id),
                )
            })?;
        let data = self.payload(message.location)?;
        Ok(RawEntry::new(topic, data, to_time_ns(message.log_time)?))
    }

    fn topics_and_types(&self) -> Result<Vec<TopicMetadata>> {
        Ok(self.topics.clone())
    }

    fn set_filter(&mut self, filter: StorageFilter) -> Result<()> {
        self.allowed = if filter.is_empty() {
            None
        } else {
            Some(
                self.channels
                    .iter()
                    .filter(|(_, c)| filter.should_include(&c.topic))
                    .map(|(&id, _)| id)
                    .collect(),
            )
        };
        Ok(())
    }

    fn statistics(&self) -> Result<RecordingStats> {
        let mut stats = RecordingStats {
            topic_counts: self.topics.iter().map(|t| (t.name.clone(), 0)).collect(),
            ..RecordingStats::default()
        };
        for message in &self.index {
            if let Some(channel) = self.channels.get(&message.channel_id) {
                stats.record(&channel.topic, to_time_ns(message.log_time)?);
            }
        }
        Ok(stats)
    }
}

fn to_time_ns(log_time: u64) -> Result<i64> {
    i64::try_from(log_time)
        .map_err(|_| BagError::storage("mcap", format!("log time {log_time} out of range")))
}

fn resolve_mcap_path(path: &Path) -> Result<PathBuf> {
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
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("mcap"))
        .collect();
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(BagError::open(display, "directory contains no .mcap file")),
        n => Err(BagError::open(
            display,
            format!("directory contains {n} .mcap files, expected exactly one"),
        )),
    }
}

fn topics_from_scan(scan: &Scan) -> Vec<TopicMetadata> {
    let mut topics: Vec<TopicMetadata> = Vec::with_capacity(scan.channels.len());
    for channel in scan.channels.values() {
        if topics.iter().any(|t| t.name == channel.topic) {
            continue;
        }
        let schema = scan.schemas.get(&channel.schema_id);
        let mut topic = TopicMetadata::new(
            channel.topic.clone(),
            schema.map(|s| s.name.clone()).unwrap_or_default(),
        )
        .with_serialization_format(channel.message_encoding.clone())
        .with_qos_profiles(
            channel
                .metadata
                .get(QOS_METADATA_KEY)
                .cloned()
                .unwrap_or_default(),
        );
        if let Some(schema) = schema.filter(|s| !s.data.is_empty()) {
            topic = topic.with_definition(
                schema.encoding.clone(),
                String::from_utf8_lossy(&schema.data).into_owned(),
            );
        }
        topics.push(topic);
    }
    topics
}

/// Walk the records of `data` starting at `pos`.
///
/// `chunk` is the index of the chunk `data` was decompressed from, or `None`
/// for the file itself.
fn scan_records(data: &[u8], mut pos: usize, chunk: Option<usize>, scan: &mut Scan) -> Result<()> {
    while pos + RECORD_PREFIX_LEN <= data.len() {
        let opcode = data[pos];
        let length = usize::try_from(LittleEndian::read_u64(&data[pos + 1..pos + RECORD_PREFIX_LEN]))
            .map_err(|_| BagError::storage("mcap", "record length overflow"))?;
        let body_start = pos + RECORD_PREFIX_LEN;
        let body_end = body_start
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                BagError::storage(
                    "mcap",
                    format!("record 0x{opcode:02x} at offset {pos} exceeds data bounds"),
                )
            })?;
        let body = &data[body_start..body_end];

        match opcode {
            OP_SCHEMA => {
                let mut fields = FieldReader::new(body);
                let id = fields.u16()?;
                let name = fields.string()?;
                let encoding = fields.string()?;
                let schema_data = fields.prefixed_bytes()?.to_vec();
                scan.schemas.entry(id).or_insert(SchemaInfo {
                    name,
                    encoding,
                    data: schema_data,
                });
            }
            OP_CHANNEL => {
                let mut fields = FieldReader::new(body);
                let id = fields.u16()?;
                let schema_id = fields.u16()?;
                let topic = fields.string()?;
                let message_encoding = fields.string()?;
                let metadata = fields.string_map()?;
                scan.channels.entry(id).or_insert(ChannelInfo {
                    topic,
                    schema_id,
                    message_encoding,
                    metadata,
                });
            }
            OP_MESSAGE => {
                if body.len() < MESSAGE_HEADER_LEN {
                    return Err(BagError::storage(
                        "mcap",
                        format!("truncated message record at offset {pos}"),
                    ));
                }
                let channel_id = LittleEndian::read_u16(&body[0..2]);
                let log_time = LittleEndian::read_u64(&body[6..14]);
                let (start, end) = (body_start + MESSAGE_HEADER_LEN, body_end);
                let location = match chunk {
                    Some(chunk) => Location::Chunk { chunk, start, end },
                    None => Location::File { start, end },
                };
                scan.index.push(MessageRef {
                    log_time,
                    channel_id,
                    location,
                });
            }
            OP_CHUNK if chunk.is_none() => {
                let mut fields = FieldReader::new(body);
                let _message_start_time = fields.u64()?;
                let _message_end_time = fields.u64()?;
                let uncompressed_size = usize::try_from(fields.u64()?)
                    .map_err(|_| BagError::storage("mcap", "chunk size overflow"))?;
                let uncompressed_crc = fields.u32()?;
                let compression = fields.string()?;
                let records_len = usize::try_from(fields.u64()?)
                    .map_err(|_| BagError::storage("mcap", "chunk size overflow"))?;
                let start = body_start + fields.position();
                let end = start
                    .checked_add(records_len)
                    .filter(|&end| end <= body_end)
                    .ok_or_else(|| {
                        BagError::storage("mcap", format!("chunk at offset {pos} is truncated"))
                    })?;

                let info = ChunkInfo {
                    start,
                    end,
                    compression,
                    uncompressed_size,
                    uncompressed_crc,
                };
                let records = decompress_chunk(&info, &data[start..end])?;
                let chunk_index = scan.chunks.len();
                scan.chunks.push(info);
                scan_records(&records, 0, Some(chunk_index), scan)?;
            }
            OP_DATA_END | OP_FOOTER if chunk.is_none() => break,
            _ => {}
        }
        pos = body_end;
    }
    Ok(())
}

fn decompress_chunk(info: &ChunkInfo, compressed: &[u8]) -> Result<Vec<u8>> {
    let records = match info.compression.as_str() {
        COMPRESSION_NONE => compressed.to_vec(),
        COMPRESSION_ZSTD => zstd::bulk::decompress(compressed, info.uncompressed_size)
            .map_err(|e| BagError::storage("mcap", format!("zstd decompression failed: {e}")))?,
        COMPRESSION_LZ4 => {
            let mut records = Vec::with_capacity(info.uncompressed_size);
            lz4_flex::frame::FrameDecoder::new(compressed)
                .read_to_end(&mut records)
                .map_err(|e| BagError::storage("mcap", format!("lz4 decompression failed: {e}")))?;
            records
        }
        other => {
            return Err(BagError::storage(
                "mcap",
                format!("unsupported chunk compression '{other}'"),
            ))
        }
    };

    if records.len() != info.uncompressed_size {
        return Err(BagError::storage(
            "mcap",
            format!(
                "chunk decompressed to {} bytes, expected {}",
                records.len(),
                info.uncompressed_size
            ),
        ));
    }
    // A zero crc means none was recorded.
    if info.uncompressed_crc != 0 && crc32fast::hash(&records) != info.uncompressed_crc {
        return Err(BagError::storage("mcap", "chunk crc mismatch"));
    }
    Ok(records)
}

/// Little-endian field reader over one record body.
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| BagError::length_exceeded(n, self.pos, self.data.len()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    fn prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.u32()? as usize;
        self.take(len)
    }

    fn string(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.prefixed_bytes()?).into_owned())
    }

    fn string_map(&mut self) -> Result<BTreeMap<String, String>> {
        let mut entries = FieldReader::new(self.prefixed_bytes()?);
        let mut map = BTreeMap::new();
        while entries.pos < entries.data.len() {
            let key = entries.string()?;
            let value = entries.string()?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_reader() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u16.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(b"abc");
        let mut fields = FieldReader::new(&data);
        assert_eq!(fields.u16().unwrap(), 7);
        assert_eq!(fields.string().unwrap(), "abc");
        assert!(fields.u16().is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let err = McapCursor::open("/definitely/missing.mcap").err().unwrap();
        assert!(matches!(err, BagError::Open { .. }));
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn test_open_rejects_bad_magic() {
        let path = std::env::temp_dir().join(format!("bagrecord_badmagic_{}.mcap", std::process::id()));
        std::fs::write(&path, b"definitely not mcap").unwrap();
        let err = McapCursor::open(&path).err().unwrap();
        assert!(err.to_string().contains("bad magic"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unfinished_file_without_summary() {
        use crate::io::formats::mcap::constants::OP_HEADER;

        // Header, schema, channel and one top-level message; no footer.
        let mut file = MCAP_MAGIC.to_vec();
        let mut push = |opcode: u8, body: &[u8]| {
            file.push(opcode);
            file.extend_from_slice(&(body.len() as u64).to_le_bytes());
            file.extend_from_slice(body);
        };
        push(OP_HEADER, &[0, 0, 0, 0, 0, 0, 0, 0]);

        let mut schema = Vec::new();
        schema.extend_from_slice(&1u16.to_le_bytes());
        for s in ["std_msgs/msg/Int32", "ros2msg"] {
            schema.extend_from_slice(&(s.len() as u32).to_le_bytes());
            schema.extend_from_slice(s.as_bytes());
        }
        schema.extend_from_slice(&0u32.to_le_bytes());
        push(OP_SCHEMA, &schema);

        let mut channel = Vec::new();
        channel.extend_from_slice(&0u16.to_le_bytes());
        channel.extend_from_slice(&1u16.to_le_bytes());
        for s in ["/n", "cdr"] {
            channel.extend_from_slice(&(s.len() as u32).to_le_bytes());
            channel.extend_from_slice(s.as_bytes());
        }
        channel.extend_from_slice(&0u32.to_le_bytes());
        push(OP_CHANNEL, &channel);

        let mut message = Vec::new();
        message.extend_from_slice(&0u16.to_le_bytes());
        message.extend_from_slice(&0u32.to_le_bytes());
        message.extend_from_slice(&42u64.to_le_bytes());
        message.extend_from_slice(&42u64.to_le_bytes());
        message.extend_from_slice(&[0, 1, 0, 0, 9, 0, 0, 0]);
        push(OP_MESSAGE, &message);

        let path = std::env::temp_dir().join(format!("bagrecord_nosummary_{}.mcap", std::process::id()));
        std::fs::write(&path, &file).unwrap();

        let mut cursor = McapCursor::open(&path).unwrap();
        let topics = cursor.topics_and_types().unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].name, "/n");
        assert_eq!(topics[0].type_name, "std_msgs/msg/Int32");
        assert_eq!(topics[0].definition, None);

        assert!(cursor.has_next().unwrap());
        let entry = cursor.read_next().unwrap();
        assert_eq!(entry.topic, "/n");
        assert_eq!(entry.time_ns, 42);
        assert_eq!(entry.data, vec![0, 1, 0, 0, 9, 0, 0, 0]);
        assert!(!cursor.has_next().unwrap());

        let _ = std::fs::remove_file(&path);
    }
}
