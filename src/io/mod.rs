// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for ROS 2 recordings.
//!
//! - [`traits`]: the cursor and sink traits every backend implements
//! - [`formats`]: the sqlite3 and MCAP backends
//! - [`reader`]: records on top of a cursor
//! - [`writer`]: new recordings

pub mod detection;
pub mod filter;
pub mod formats;
pub mod metadata;
pub mod reader;
pub mod traits;
pub mod writer;

pub use detection::detect_storage;
pub use filter::StorageFilter;
pub use metadata::{
    ConverterOptions, RawEntry, RecordingStats, StorageKind, StorageOptions, TopicMetadata,
    TypeMap,
};
pub use reader::{BagReader, Records, RESERVED_KEYS};
pub use traits::{RecordingSink, SequentialCursor};
pub use writer::RecordingWriter;
