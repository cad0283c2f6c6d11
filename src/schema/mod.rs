// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema handling for ROS 2 interface types.
//!
//! This module provides:
//! - `.msg` parsing (with embedded dependency blocks)
//! - message specification strings (`package/category/Name`)
//! - predefined builtin types
//! - resolved [`TypeDescriptor`]s handed to deserializers

pub mod ast;
pub mod builtin_types;
pub mod descriptor;
pub mod parser;
pub mod spec;

pub use ast::{Field, FieldType, MessageSchema, MessageType, PrimitiveType};
pub use descriptor::{FieldInfo, TypeDescriptor};
pub use parser::{msg_parser, parse_schema, parse_schema_with_encoding};
pub use spec::{normalize_reference, MessageSpec};
