// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # bagrecord
//!
//! Read ROS 2 bag recordings as ordered field records.
//!
//! A recording is opened through one of two storage backends, rosbag2
//! SQLite (`.db3`, the default) or MCAP. Every stored CDR payload is decoded
//! against its message type into a [`Fields`] mapping, prefixed with the
//! reserved keys `topic`, `time_ns` and `type`.
//!
//! ## Architecture
//!
//! - `core/` - errors, decoded values, the type registry
//! - `schema/` - `.msg` parsing, spec strings, type descriptors
//! - `encoding/` - CDR deserializer and encoder
//! - `io/` - storage backends, the record reader, the recording writer
//! - `config` - reader options, loadable from TOML
//!
//! ## Example: Reading records
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use bagrecord::BagReader;
//!
//! let mut reader = BagReader::open_path("talker")?;
//! for (topic, type_name) in reader.type_map()? {
//!     println!("{topic}: {type_name}");
//! }
//! for record in reader.iter() {
//!     let record = record?;
//!     println!("{:?}", record.get("data"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Reading an MCAP file with options
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use bagrecord::{BagReader, ReaderOptions};
//!
//! let options = ReaderOptions::new("run.mcap")
//!     .with_storage_id("mcap")
//!     .with_topics(["/odom"])
//!     .with_message_path("/opt/ros/humble/share");
//! let mut reader = BagReader::with_options(options)?;
//! let records = reader.records()?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{BagError, CodecValue, Encoding, Fields, Result, TypeRegistry};

// Configuration
pub mod config;

pub use config::ReaderOptions;

// Encoding/decoding
pub mod encoding;

// Schema parsing
pub mod schema;

// I/O: backends, reader, writer
pub mod io;

pub use io::metadata::{StorageKind, TopicMetadata, TypeMap};
pub use io::{BagReader, RecordingWriter, Records};

// Python bindings (optional)
#[cfg(feature = "python")]
pub mod python;
