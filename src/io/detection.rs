// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage backend detection.
//!
//! A recording is either a single file or a rosbag2 bag directory holding
//! one storage file next to its `metadata.yaml`. Files are identified by
//! magic bytes first, then by extension.
//!
//! # Example
//!
//! ```rust,no_run
//! use bagrecord::io::detection::detect_storage;
//! use bagrecord::io::metadata::StorageKind;
//!
//! let kind = detect_storage("recordings/run_01")?;
//! assert_eq!(kind, StorageKind::Sqlite3);
//! # Ok::<(), bagrecord::BagError>(())
//! ```

use std::path::Path;

use tracing::debug;

use crate::core::{BagError, Result};

use super::metadata::StorageKind;

/// Detect the storage backend of a recording file or bag directory.
pub fn detect_storage<P: AsRef<Path>>(path: P) -> Result<StorageKind> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    if !path.exists() {
        return Err(BagError::open(path_str, "file does not exist"));
    }

    if path.is_dir() {
        let mut found: Vec<StorageKind> = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if !entry_path.is_file() {
                continue;
            }
            let by_extension = StorageKind::ALL
                .into_iter()
                .find(|k| entry_path.extension().and_then(|e| e.to_str()) == Some(k.extension()));
            if let Some(kind) = by_extension {
                found.push(kind);
            }
        }
        found.dedup();
        return match found.as_slice() {
            [kind] => {
                debug!(path = %path_str, storage = %kind, "detected storage in bag directory");
                Ok(*kind)
            }
            [] => Err(BagError::open(path_str, "no recording file in directory")),
            _ => Err(BagError::open(
                path_str,
                "directory holds recordings of more than one storage type",
            )),
        };
    }

    StorageKind::detect(path)
        .ok_or_else(|| BagError::open(path_str, "unrecognized recording format"))
}
