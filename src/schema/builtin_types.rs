// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Predefined ROS 2 interface types.
//!
//! This module provides the standard types that recordings commonly use, so a
//! reader can decode them without any .msg files on disk.
//!
//! ## Supported Types
//!
//! - `builtin_interfaces/msg/{Time,Duration}`
//! - `std_msgs/msg/{Header,String,Bool,Int32,Int64,Float32,Float64,Empty}`
//! - `example_interfaces/msg/{String,Bool,Int32,Int64,Float64}`
//! - `geometry_msgs/msg/{Vector3,Point,Quaternion,Pose}`
//!
//! Time and Duration have the same structure:
//! ```text
//! int32 sec
//! uint32 nanosec
//! ```

use crate::core::Result;
use crate::schema::ast::{Field, FieldType, MessageType, PrimitiveType};
use crate::schema::parser::parse_schema;

/// Single-type definitions, as .msg text.
const DEFINITIONS: &[(&str, &str)] = &[
    ("std_msgs/msg/String", "string data"),
    ("std_msgs/msg/Bool", "bool data"),
    ("std_msgs/msg/Int32", "int32 data"),
    ("std_msgs/msg/Int64", "int64 data"),
    ("std_msgs/msg/Float32", "float32 data"),
    ("std_msgs/msg/Float64", "float64 data"),
    ("std_msgs/msg/Empty", ""),
    ("example_interfaces/msg/String", "string data"),
    ("example_interfaces/msg/Bool", "bool data"),
    ("example_interfaces/msg/Int32", "int32 data"),
    ("example_interfaces/msg/Int64", "int64 data"),
    ("example_interfaces/msg/Float64", "float64 data"),
    ("geometry_msgs/msg/Vector3", "float64 x\nfloat64 y\nfloat64 z"),
    ("geometry_msgs/msg/Point", "float64 x\nfloat64 y\nfloat64 z"),
    (
        "geometry_msgs/msg/Quaternion",
        "float64 x 0\nfloat64 y 0\nfloat64 z 0\nfloat64 w 1",
    ),
    ("geometry_msgs/msg/Pose", "Point position\nQuaternion orientation"),
];

fn sec_nanosec(name: &str) -> MessageType {
    let mut msg_type = MessageType::new(name.to_string());

    msg_type.add_field(Field {
        name: "sec".to_string(),
        type_name: FieldType::Primitive(PrimitiveType::Int32),
    });

    msg_type.add_field(Field {
        name: "nanosec".to_string(),
        type_name: FieldType::Primitive(PrimitiveType::UInt32),
    });

    msg_type
}

/// Create the predefined builtin_interfaces/msg/Time type.
fn builtin_time() -> MessageType {
    sec_nanosec("builtin_interfaces/msg/Time")
}

/// Create the predefined builtin_interfaces/msg/Duration type.
fn builtin_duration() -> MessageType {
    sec_nanosec("builtin_interfaces/msg/Duration")
}

/// Create the predefined std_msgs/msg/Header type.
///
/// ROS 2 header: no `seq` field.
fn builtin_header() -> MessageType {
    let mut msg_type = MessageType::new("std_msgs/msg/Header".to_string());

    msg_type.add_field(Field {
        name: "stamp".to_string(),
        type_name: FieldType::Nested("builtin_interfaces/msg/Time".to_string()),
    });

    msg_type.add_field(Field {
        name: "frame_id".to_string(),
        type_name: FieldType::Primitive(PrimitiveType::String),
    });

    msg_type
}

/// Get all predefined message types.
pub fn get_all() -> Result<Vec<MessageType>> {
    let mut types = vec![builtin_time(), builtin_duration(), builtin_header()];
    for (name, definition) in DEFINITIONS {
        let mut schema = parse_schema(name, definition)?;
        if let Some(root) = schema.types.remove(*name) {
            types.push(root);
        }
    }
    Ok(types)
}
