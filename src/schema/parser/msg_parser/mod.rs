// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MSG format parser using Pest.
//!
//! This module handles parsing of ROS 2 .msg definitions.
//!
//! The format supports:
//! - Simple field lists (root message)
//! - Dependency blocks with "MSG: TypeName" headers, as embedded in MCAP
//!   `ros2msg` schemas
//! - Array types: T[] (sequence), T[n] (fixed), T[<=n] (bounded, read as sequence)
//! - Bounded strings: string<=n
//! - Nested types: Name, package/Name or package/msg/Name
//! - Constants (skipped) and default values (ignored)
//! - Comments (# style)
//!
//! Nested type references are expanded to full spec strings while parsing, so
//! every [`FieldType::Nested`] in the result names a `package/category/Name`.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::core::{BagError, Result};
use crate::schema::ast::{Field, FieldType, MessageSchema, MessageType, PrimitiveType};
use crate::schema::spec::normalize_reference;

/// Pest parser for ROS .msg schema files.
#[derive(Parser)]
#[grammar = "schema/parser/msg_parser/msg.pest"] // Path relative to src/ directory
pub struct MsgParser;

/// Parse a .msg definition for the type `name` (a full spec string).
pub fn parse(name: &str, definition: &str) -> Result<MessageSchema> {
    let mut text = definition.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let pairs = MsgParser::parse(Rule::schema, &text)
        .map_err(|e| BagError::parse(format!("msg definition of '{name}'"), e.to_string()))?;

    let mut schema = MessageSchema::new(name.to_string());
    let root_package = schema.package.clone();

    for pair in pairs {
        // schema = SOI ~ root_msg ~ (separator ~ dependency_msg)* ~ EOI
        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::root_msg => {
                    let mut msg_type = MessageType::new(name.to_string());
                    for field_item in item.into_inner() {
                        if let Some(field) = parse_field(field_item, root_package.as_deref()) {
                            msg_type.add_field(field);
                        }
                    }
                    schema.add_type(msg_type);
                }
                Rule::dependency_msg => {
                    let mut inner = item.into_inner();
                    let Some(header) = inner.next() else {
                        continue;
                    };
                    let reference = header
                        .into_inner()
                        .next()
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_default();
                    let type_name = normalize_reference(&reference, root_package.as_deref());
                    let package = type_name.split('/').next().map(str::to_string);

                    let mut msg_type = MessageType::new(type_name);
                    for field_item in inner {
                        if let Some(field) = parse_field(field_item, package.as_deref()) {
                            msg_type.add_field(field);
                        }
                    }
                    schema.add_type(msg_type);
                }
                _ => {}
            }
        }
    }

    Ok(schema)
}

/// Convert a `field` pair into a [`Field`]. Constants yield `None`.
fn parse_field(pair: Pair<'_, Rule>, package: Option<&str>) -> Option<Field> {
    if pair.as_rule() != Rule::field {
        return None;
    }

    let mut type_path = "";
    let mut array_suffix: Option<&str> = None;
    let mut field_name = "";

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::field_type => {
                for type_part in part.into_inner() {
                    match type_part.as_rule() {
                        Rule::type_path => type_path = type_part.as_str(),
                        Rule::array_suffix => array_suffix = Some(type_part.as_str()),
                        _ => {}
                    }
                }
            }
            Rule::field_name => field_name = part.as_str(),
            _ => {}
        }
    }

    let base = match PrimitiveType::try_from_str(type_path) {
        Some(prim) => FieldType::Primitive(prim),
        None => FieldType::Nested(normalize_reference(type_path, package)),
    };

    let type_name = match array_suffix {
        Some(suffix) => FieldType::Array {
            base_type: Box::new(base),
            size: fixed_array_size(suffix),
        },
        None => base,
    };

    Some(Field {
        name: field_name.to_string(),
        type_name,
    })
}

/// `[N]` is a fixed array; `[]` and `[<=N]` are sequences.
fn fixed_array_size(suffix: &str) -> Option<usize> {
    let inner = suffix.trim_start_matches('[').trim_end_matches(']');
    if inner.is_empty() || inner.starts_with("<=") {
        None
    } else {
        inner.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fields() {
        let schema = parse("example_interfaces/msg/String", "string data").unwrap();
        let root = schema.root().unwrap();
        assert_eq!(root.fields.len(), 1);
        assert_eq!(root.fields[0].name, "data");
        assert_eq!(
            root.fields[0].type_name,
            FieldType::Primitive(PrimitiveType::String)
        );
    }

    #[test]
    fn test_parse_empty_definition() {
        let schema = parse("std_msgs/msg/Empty", "").unwrap();
        assert!(schema.root().unwrap().fields.is_empty());
    }

    #[test]
    fn test_parse_comments_constants_defaults() {
        let text = "# leading comment\n\
                    int32 LIMIT=10\n\
                    string NAME = \"x\"  # constant with comment\n\
                    \n\
                    int32 count 5   # default value\n\
                    float64 ratio\t# trailing\n";
        let schema = parse("pkg/msg/Thing", text).unwrap();
        let names: Vec<&str> = schema
            .root()
            .unwrap()
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["count", "ratio"]);
    }

    #[test]
    fn test_parse_arrays_and_bounds() {
        let text = "int32[] seq\nfloat64[3] fixed\nuint8[<=4] bounded\nstring<=8 label\nstring<=8[2] labels";
        let schema = parse("pkg/msg/Arrays", text).unwrap();
        let fields = &schema.root().unwrap().fields;

        assert!(matches!(&fields[0].type_name, FieldType::Array { size: None, .. }));
        assert!(matches!(
            &fields[1].type_name,
            FieldType::Array { size: Some(3), .. }
        ));
        assert!(matches!(&fields[2].type_name, FieldType::Array { size: None, .. }));
        assert_eq!(
            fields[3].type_name,
            FieldType::Primitive(PrimitiveType::String)
        );
        assert!(matches!(
            &fields[4].type_name,
            FieldType::Array { size: Some(2), .. }
        ));
    }

    #[test]
    fn test_parse_relative_references() {
        let text = "Header header\nPoint position\ngeometry_msgs/Quaternion orientation\nbuiltin_interfaces/msg/Time stamp";
        let schema = parse("geometry_msgs/msg/Stamped", text).unwrap();
        let fields = &schema.root().unwrap().fields;

        assert_eq!(
            fields[0].type_name,
            FieldType::Nested("std_msgs/msg/Header".to_string())
        );
        assert_eq!(
            fields[1].type_name,
            FieldType::Nested("geometry_msgs/msg/Point".to_string())
        );
        assert_eq!(
            fields[2].type_name,
            FieldType::Nested("geometry_msgs/msg/Quaternion".to_string())
        );
        assert_eq!(
            fields[3].type_name,
            FieldType::Nested("builtin_interfaces/msg/Time".to_string())
        );
    }

    #[test]
    fn test_parse_dependency_blocks() {
        let text = "std_msgs/Header header\n\
                    Pose[] poses\n\
                    ================================================================================\n\
                    MSG: std_msgs/Header\n\
                    builtin_interfaces/Time stamp\n\
                    string frame_id\n\
                    ================================================================================\n\
                    MSG: pkg/Pose\n\
                    float64 x\n";
        let schema = parse("pkg/msg/Path", text).unwrap();

        assert_eq!(schema.types.len(), 3);
        let header = schema.get_type("std_msgs/msg/Header").unwrap();
        assert_eq!(header.fields.len(), 2);
        assert_eq!(
            header.fields[0].type_name,
            FieldType::Nested("builtin_interfaces/msg/Time".to_string())
        );
        assert!(schema.get_type("pkg/msg/Pose").is_some());
    }

    #[test]
    fn test_parse_alignment_tracking() {
        let schema = parse("pkg/msg/Mixed", "uint8 a\nfloat64 b").unwrap();
        assert_eq!(schema.root().unwrap().max_alignment, 8);
    }

    #[test]
    fn test_parse_error_reports_type() {
        let err = parse("pkg/msg/Broken", "int32\n").unwrap_err();
        assert!(matches!(err, BagError::Parse { .. }));
        assert!(err.to_string().contains("pkg/msg/Broken"));
    }
}
