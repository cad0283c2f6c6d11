// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP storage.
//!
//! - [`McapCursor`]: memory-mapped sequential reader, timestamp ordered
//! - [`McapWriter`]: chunked writer with a summary section
//!
//! Chunks compressed with zstd, lz4 or nothing are supported.

pub mod constants;
pub mod reader;
pub mod writer;

pub use constants::MCAP_MAGIC;
pub use reader::McapCursor;
pub use writer::{ChunkCompression, McapWriter, DEFAULT_CHUNK_SIZE};
