// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage backend implementations.
//!
//! - [`sqlite`]: rosbag2 SQLite databases (`.db3`)
//! - [`mcap`]: MCAP containers
//!
//! The backend set is closed; [`open_cursor`] and [`create_sink`] dispatch
//! on [`StorageKind`].

pub mod mcap;
pub mod sqlite;

use std::path::Path;

use tracing::debug;

use crate::core::{BagError, Result};
use crate::io::metadata::{StorageKind, StorageOptions};
use crate::io::traits::{RecordingSink, SequentialCursor};

/// Open a sequential cursor for the given storage options.
///
/// An unknown storage identifier is reported as an open failure.
pub fn open_cursor(options: &StorageOptions) -> Result<Box<dyn SequentialCursor>> {
    let kind = options.kind().map_err(|e| {
        BagError::open(options.uri.display().to_string(), e.to_string())
    })?;
    debug!(path = %options.uri.display(), storage = %kind, "opening cursor");
    match kind {
        StorageKind::Sqlite3 => Ok(Box::new(sqlite::SqliteCursor::open(&options.uri)?)),
        StorageKind::Mcap => Ok(Box::new(mcap::McapCursor::open(&options.uri)?)),
    }
}

/// Create a writer for a new recording.
pub fn create_sink(path: &Path, kind: StorageKind) -> Result<Box<dyn RecordingSink>> {
    match kind {
        StorageKind::Sqlite3 => Ok(Box::new(sqlite::SqliteWriter::create(path)?)),
        StorageKind::Mcap => Ok(Box::new(mcap::McapWriter::create(path)?)),
    }
}
