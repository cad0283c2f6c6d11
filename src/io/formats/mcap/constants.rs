// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP format constants.
//!
//! Opcodes and magic bytes as defined by the
//! [MCAP specification](https://mcap.dev/spec).

/// MCAP file magic bytes (at start and end of file).
pub const MCAP_MAGIC: [u8; 8] = [0x89, 0x4D, 0x43, 0x41, 0x50, 0x30, 0x0D, 0x0A];

/// Header record - must be first record after magic.
pub const OP_HEADER: u8 = 0x01;
/// Footer record - contains summary section offsets.
pub const OP_FOOTER: u8 = 0x02;
/// Schema record - defines message schemas.
pub const OP_SCHEMA: u8 = 0x03;
/// Channel record - defines channels/topics.
pub const OP_CHANNEL: u8 = 0x04;
/// Message record - contains message data.
pub const OP_MESSAGE: u8 = 0x05;
/// Chunk record - contains compressed messages.
pub const OP_CHUNK: u8 = 0x06;
/// Chunk index record - indexes chunks in summary section.
pub const OP_CHUNK_INDEX: u8 = 0x08;
/// Statistics record - contains file-level statistics.
pub const OP_STATISTICS: u8 = 0x0B;
/// Data end record - marks end of data section.
pub const OP_DATA_END: u8 = 0x0F;

/// Profile written in the header of ROS 2 recordings.
pub const PROFILE_ROS2: &str = "ros2";

/// Schema encoding of ROS 2 `.msg` definitions.
pub const SCHEMA_ENCODING_ROS2MSG: &str = "ros2msg";

/// Channel metadata key holding the QoS profiles.
pub const QOS_METADATA_KEY: &str = "offered_qos_profiles";

/// Chunk compression identifiers.
pub const COMPRESSION_NONE: &str = "";
/// Zstandard chunk compression.
pub const COMPRESSION_ZSTD: &str = "zstd";
/// LZ4 frame chunk compression.
pub const COMPRESSION_LZ4: &str = "lz4";
