// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema parser implementations.

pub mod msg_parser;

use crate::core::{BagError, Result};
use crate::schema::MessageSchema;

/// Schema encodings understood by [`parse_schema_with_encoding`].
pub const SUPPORTED_ENCODINGS: &[&str] = &["ros2msg", "msg"];

/// Parse a .msg definition.
///
/// # Arguments
///
/// * `name` - Full spec string of the root type
/// * `definition` - Definition text, optionally with dependency blocks
pub fn parse_schema(name: &str, definition: &str) -> Result<MessageSchema> {
    msg_parser::parse(name, definition)
}

/// Parse a schema carried with an explicit encoding, as stored in recordings.
pub fn parse_schema_with_encoding(
    name: &str,
    definition: &str,
    encoding: &str,
) -> Result<MessageSchema> {
    let encoding_lower = encoding.to_lowercase();
    if SUPPORTED_ENCODINGS.contains(&encoding_lower.as_str()) {
        parse_schema(name, definition)
    } else {
        Err(BagError::parse(
            format!("schema of '{name}'"),
            format!("unsupported schema encoding '{encoding}'"),
        ))
    }
}
