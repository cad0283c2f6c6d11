// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! AST types for parsed ROS 2 .msg definitions.

use std::collections::HashMap;

/// A parsed .msg definition: the root type plus any dependency blocks it embeds.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    /// Root type spec string (e.g., "std_msgs/msg/Header")
    pub name: String,
    /// Package name (e.g., "std_msgs")
    pub package: Option<String>,
    /// All types defined in this schema, keyed by full spec string
    pub types: HashMap<String, MessageType>,
}

/// A message type definition with its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageType {
    /// Full spec string of the type
    pub name: String,
    /// Ordered list of fields
    pub fields: Vec<Field>,
    /// Maximum alignment required for this type
    pub max_alignment: u64,
}

/// A field in a message type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    pub type_name: FieldType,
}

/// Field type - can be primitive, array, or nested message.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Primitive type
    Primitive(PrimitiveType),
    /// Array type
    Array {
        /// Base type (element type)
        base_type: Box<FieldType>,
        /// Array size (None = sequence, Some(N) = fixed)
        size: Option<usize>,
    },
    /// Nested message type, as a full spec string
    Nested(String),
}

/// Primitive ROS 2 interface types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Boolean
    Bool,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// String
    String,
    /// Wide string (UTF-16)
    WString,
    /// Byte (octet)
    Byte,
    /// Char (octet in ROS 2)
    Char,
}

impl PrimitiveType {
    /// Get the alignment requirement for this primitive type.
    pub fn alignment(self) -> u64 {
        match self {
            PrimitiveType::Bool
            | PrimitiveType::Int8
            | PrimitiveType::UInt8
            | PrimitiveType::Byte
            | PrimitiveType::Char => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
            PrimitiveType::String | PrimitiveType::WString => 4, // Length prefix is 4-byte aligned
        }
    }

    /// Get the size in bytes for this primitive type, if fixed.
    pub fn size(self) -> Option<usize> {
        match self {
            PrimitiveType::Bool
            | PrimitiveType::Int8
            | PrimitiveType::UInt8
            | PrimitiveType::Byte
            | PrimitiveType::Char => Some(1),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => Some(4),
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => Some(8),
            PrimitiveType::String | PrimitiveType::WString => None,
        }
    }

    /// Parse a primitive type from its .msg keyword.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "bool" | "boolean" => Some(PrimitiveType::Bool),
            "int8" => Some(PrimitiveType::Int8),
            "int16" => Some(PrimitiveType::Int16),
            "int32" => Some(PrimitiveType::Int32),
            "int64" => Some(PrimitiveType::Int64),
            "uint8" => Some(PrimitiveType::UInt8),
            "uint16" => Some(PrimitiveType::UInt16),
            "uint32" => Some(PrimitiveType::UInt32),
            "uint64" => Some(PrimitiveType::UInt64),
            "float32" | "float" => Some(PrimitiveType::Float32),
            "float64" | "double" => Some(PrimitiveType::Float64),
            "string" => Some(PrimitiveType::String),
            "wstring" => Some(PrimitiveType::WString),
            "byte" | "octet" => Some(PrimitiveType::Byte),
            "char" => Some(PrimitiveType::Char),
            _ => None,
        }
    }

    /// The .msg keyword for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::String => "string",
            PrimitiveType::WString => "wstring",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
        }
    }

    /// Octet types decode to a byte buffer when used as a sequence element.
    pub fn is_octet(self) -> bool {
        matches!(
            self,
            PrimitiveType::UInt8 | PrimitiveType::Byte | PrimitiveType::Char
        )
    }
}

impl FieldType {
    /// Get the alignment requirement for this field type.
    pub fn alignment(&self) -> u64 {
        match self {
            FieldType::Primitive(p) => p.alignment(),
            FieldType::Array { base_type, .. } => base_type.alignment(),
            FieldType::Nested(_) => 4, // Nested structs have 4-byte alignment in CDR
        }
    }

    /// Check if this is a complex type (requires per-element alignment in arrays).
    pub fn is_complex(&self) -> bool {
        match self {
            FieldType::Primitive(p) => p.size().is_none(),
            FieldType::Array { .. } | FieldType::Nested(_) => true,
        }
    }

    /// Nested type names referenced by this field, at any array depth.
    pub fn nested_name(&self) -> Option<&str> {
        match self {
            FieldType::Nested(name) => Some(name),
            FieldType::Array { base_type, .. } => base_type.nested_name(),
            FieldType::Primitive(_) => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Primitive(p) => f.write_str(p.as_str()),
            FieldType::Array { base_type, size: Some(n) } => write!(f, "{base_type}[{n}]"),
            FieldType::Array { base_type, size: None } => write!(f, "{base_type}[]"),
            FieldType::Nested(name) => f.write_str(name),
        }
    }
}

impl MessageSchema {
    /// Create an empty schema.
    pub fn new(name: String) -> Self {
        Self {
            package: extract_package(&name),
            name,
            types: HashMap::new(),
        }
    }

    /// Register a type in this schema.
    pub fn add_type(&mut self, msg_type: MessageType) {
        self.types.insert(msg_type.name.clone(), msg_type);
    }

    /// Look up a type by name.
    pub fn get_type(&self, name: &str) -> Option<&MessageType> {
        self.types.get(name)
    }

    /// The root type, if it was parsed.
    pub fn root(&self) -> Option<&MessageType> {
        self.types.get(&self.name)
    }
}

impl MessageType {
    /// Create a new message type.
    pub fn new(name: String) -> Self {
        Self {
            name,
            fields: Vec::new(),
            max_alignment: 1,
        }
    }

    /// Add a field to this message type.
    pub fn add_field(&mut self, field: Field) {
        let field_alignment = field.type_name.alignment();
        self.max_alignment = self.max_alignment.max(field_alignment);
        self.fields.push(field);
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Extract package name from a fully-qualified type name.
fn extract_package(name: &str) -> Option<String> {
    match name.split_once('/') {
        Some((package, _)) if !package.is_empty() => Some(package.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_type_from_str() {
        assert_eq!(
            PrimitiveType::try_from_str("int32"),
            Some(PrimitiveType::Int32)
        );
        assert_eq!(
            PrimitiveType::try_from_str("float64"),
            Some(PrimitiveType::Float64)
        );
        assert_eq!(PrimitiveType::try_from_str("time"), None);
        assert_eq!(PrimitiveType::try_from_str("unknown"), None);
    }

    #[test]
    fn test_primitive_type_alignment() {
        assert_eq!(PrimitiveType::Bool.alignment(), 1);
        assert_eq!(PrimitiveType::Int16.alignment(), 2);
        assert_eq!(PrimitiveType::Int32.alignment(), 4);
        assert_eq!(PrimitiveType::Int64.alignment(), 8);
        assert_eq!(PrimitiveType::String.alignment(), 4);
    }

    #[test]
    fn test_field_type_is_complex() {
        assert!(!FieldType::Primitive(PrimitiveType::Int32).is_complex());
        assert!(FieldType::Primitive(PrimitiveType::String).is_complex());
        assert!(FieldType::Array {
            base_type: Box::new(FieldType::Primitive(PrimitiveType::Int32)),
            size: None,
        }
        .is_complex());
    }

    #[test]
    fn test_field_type_display() {
        let points = FieldType::Array {
            base_type: Box::new(FieldType::Nested("geometry_msgs/msg/Point".to_string())),
            size: None,
        };
        assert_eq!(points.to_string(), "geometry_msgs/msg/Point[]");
        let fixed = FieldType::Array {
            base_type: Box::new(FieldType::Primitive(PrimitiveType::Float64)),
            size: Some(9),
        };
        assert_eq!(fixed.to_string(), "float64[9]");
    }

    #[test]
    fn test_nested_name_through_arrays() {
        let field = FieldType::Array {
            base_type: Box::new(FieldType::Nested("geometry_msgs/msg/Point".to_string())),
            size: Some(3),
        };
        assert_eq!(field.nested_name(), Some("geometry_msgs/msg/Point"));
        assert_eq!(FieldType::Primitive(PrimitiveType::Bool).nested_name(), None);
    }

    #[test]
    fn test_schema_package() {
        let schema = MessageSchema::new("std_msgs/msg/Header".to_string());
        assert_eq!(schema.package.as_deref(), Some("std_msgs"));
        assert!(schema.root().is_none());

        let bare = MessageSchema::new("Header".to_string());
        assert_eq!(bare.package, None);
    }
}
