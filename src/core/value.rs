// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Value types produced by deserialization.
//!
//! A decoded message is a [`Fields`] mapping: field name to [`CodecValue`],
//! kept in the order the message definition declares its fields. Nested
//! messages are [`CodecValue::Struct`], sequences are [`CodecValue::Array`].
//! Both types serialize with serde as plain JSON-like values.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A single decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CodecValue {
    // Boolean
    Bool(bool),

    // Signed integers
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    // Unsigned integers
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    // Floating point
    Float32(f32),
    Float64(f64),

    // String (UTF-8, wide strings are transcoded)
    String(String),

    // Octet sequences (uint8[] / byte[])
    Bytes(Vec<u8>),

    // Fixed arrays and sequences
    Array(Vec<CodecValue>),

    // Nested message
    Struct(Fields),

    Null,
}

impl CodecValue {
    /// Check if this value is an integer type (signed or unsigned).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            CodecValue::Int8(_)
                | CodecValue::Int16(_)
                | CodecValue::Int32(_)
                | CodecValue::Int64(_)
                | CodecValue::UInt8(_)
                | CodecValue::UInt16(_)
                | CodecValue::UInt32(_)
                | CodecValue::UInt64(_)
        )
    }

    /// Widen any integer to i64, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CodecValue::Int8(v) => Some(*v as i64),
            CodecValue::Int16(v) => Some(*v as i64),
            CodecValue::Int32(v) => Some(*v as i64),
            CodecValue::Int64(v) => Some(*v),
            CodecValue::UInt8(v) => Some(*v as i64),
            CodecValue::UInt16(v) => Some(*v as i64),
            CodecValue::UInt32(v) => Some(*v as i64),
            CodecValue::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Widen any number to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodecValue::Float32(v) => Some(*v as f64),
            CodecValue::Float64(v) => Some(*v),
            CodecValue::UInt64(v) => Some(*v as f64),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Try to get the inner string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CodecValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the inner bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CodecValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the inner struct.
    pub fn as_struct(&self) -> Option<&Fields> {
        match self {
            CodecValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the inner array.
    pub fn as_array(&self) -> Option<&[CodecValue]> {
        match self {
            CodecValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get the type name of this value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            CodecValue::Bool(_) => "bool",
            CodecValue::Int8(_) => "int8",
            CodecValue::Int16(_) => "int16",
            CodecValue::Int32(_) => "int32",
            CodecValue::Int64(_) => "int64",
            CodecValue::UInt8(_) => "uint8",
            CodecValue::UInt16(_) => "uint16",
            CodecValue::UInt32(_) => "uint32",
            CodecValue::UInt64(_) => "uint64",
            CodecValue::Float32(_) => "float32",
            CodecValue::Float64(_) => "float64",
            CodecValue::String(_) => "string",
            CodecValue::Bytes(_) => "bytes",
            CodecValue::Array(_) => "array",
            CodecValue::Struct(_) => "struct",
            CodecValue::Null => "null",
        }
    }

    /// Estimate the in-memory size of this value in bytes.
    pub fn size_hint(&self) -> usize {
        match self {
            CodecValue::Bool(_) | CodecValue::Int8(_) | CodecValue::UInt8(_) => 1,
            CodecValue::Int16(_) | CodecValue::UInt16(_) => 2,
            CodecValue::Int32(_) | CodecValue::UInt32(_) | CodecValue::Float32(_) => 4,
            CodecValue::Int64(_) | CodecValue::UInt64(_) | CodecValue::Float64(_) => 8,
            CodecValue::String(s) => s.len(),
            CodecValue::Bytes(b) => b.len(),
            CodecValue::Null => 0,
            CodecValue::Array(arr) => {
                arr.iter().map(|v| v.size_hint()).sum::<usize>() + (arr.len() * 8)
            }
            CodecValue::Struct(fields) => fields.values().map(|v| v.size_hint()).sum::<usize>(),
        }
    }
}

impl fmt::Display for CodecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecValue::Bool(v) => write!(f, "{v}"),
            CodecValue::Int8(v) => write!(f, "{v}"),
            CodecValue::Int16(v) => write!(f, "{v}"),
            CodecValue::Int32(v) => write!(f, "{v}"),
            CodecValue::Int64(v) => write!(f, "{v}"),
            CodecValue::UInt8(v) => write!(f, "{v}"),
            CodecValue::UInt16(v) => write!(f, "{v}"),
            CodecValue::UInt32(v) => write!(f, "{v}"),
            CodecValue::UInt64(v) => write!(f, "{v}"),
            CodecValue::Float32(v) => write!(f, "{v}"),
            CodecValue::Float64(v) => write!(f, "{v}"),
            CodecValue::String(v) => write!(f, "\"{v}\""),
            CodecValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            CodecValue::Array(v) => write!(f, "[{} elements]", v.len()),
            CodecValue::Struct(v) => write!(f, "{{{} fields}}", v.len()),
            CodecValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for CodecValue {
    fn from(value: &str) -> Self {
        CodecValue::String(value.to_string())
    }
}

impl From<String> for CodecValue {
    fn from(value: String) -> Self {
        CodecValue::String(value)
    }
}

impl From<Fields> for CodecValue {
    fn from(value: Fields) -> Self {
        CodecValue::Struct(value)
    }
}

/// Ordered mapping of field name to value.
///
/// Insertion order is preserved; inserting an existing name replaces the
/// value in place. Lookups are linear, which is fine for message-sized maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, CodecValue)>,
}

impl Fields {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a field, returning the previous value if the name was present.
    pub fn insert(&mut self, name: impl Into<String>, value: CodecValue) -> Option<CodecValue> {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&CodecValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Look up a nested field by a dotted path (e.g. `header.stamp.sec`).
    pub fn get_path(&self, path: &str) -> Option<&CodecValue> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_struct()?.get(part)?;
        }
        Some(current)
    }

    /// Check if a field is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Field values in order.
    pub fn values(&self) -> impl Iterator<Item = &CodecValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Name/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CodecValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Fields {
    type Item = (String, CodecValue);
    type IntoIter = std::vec::IntoIter<(String, CodecValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, CodecValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, CodecValue)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
