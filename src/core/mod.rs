// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout bagrecord.
//!
//! This module provides the foundational types for the library:
//! - [`BagError`] - Error handling
//! - [`CodecValue`] and [`Fields`] - Decoded values
//! - [`TypeRegistry`] - Message type registry

pub mod error;
pub mod registry;
pub mod value;

pub use error::{BagError, Result};
pub use registry::TypeRegistry;
pub use value::{CodecValue, Fields};

/// Serialization formats a recording may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// CDR (Common Data Representation), the ROS 2 default
    #[default]
    Cdr,
}

/// Error returned when parsing an `Encoding` from string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEncodingError {
    name: String,
}

impl std::fmt::Display for ParseEncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported serialization format '{}', expected 'cdr'",
            self.name
        )
    }
}

impl std::error::Error for ParseEncodingError {}

impl std::str::FromStr for Encoding {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cdr" => Ok(Encoding::Cdr),
            _ => Err(ParseEncodingError {
                name: s.to_string(),
            }),
        }
    }
}

impl Encoding {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Cdr => "cdr",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
