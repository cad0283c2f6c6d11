// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR (Common Data Representation) module.
//!
//! Provides CDR decoding and encoding for ROS 2 messages (XCDR1, plain
//! encapsulation, either byte order).

pub mod cursor;
pub mod decoder;
pub mod encoder;

pub use cursor::{CdrCursor, CDR_HEADER_SIZE};
pub use decoder::CdrDeserializer;
pub use encoder::{CdrEncoder, EncapsulationKind};
