// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! rosbag2 SQLite (`.db3`) storage.

pub mod reader;
pub mod writer;

pub use reader::SqliteCursor;
pub use writer::SqliteWriter;
