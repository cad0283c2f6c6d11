// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema-driven CDR decoder.
//!
//! Walks a [`TypeDescriptor`] field by field and reads each value from a
//! [`CdrCursor`], producing an ordered [`Fields`] mapping. Nested messages
//! become [`CodecValue::Struct`]; octet sequences become [`CodecValue::Bytes`].

use super::cursor::CdrCursor;
use crate::core::{BagError, CodecValue, Fields, Result};
use crate::encoding::Deserializer;
use crate::schema::{FieldType, MessageType, PrimitiveType, TypeDescriptor};

/// Upper bound on any length prefix (strings, sequences).
const MAX_ARRAY_LENGTH: usize = 10_000_000;

/// Upper bound on message nesting.
const MAX_DEPTH: usize = 32;

/// CDR deserializer for ROS 2 payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdrDeserializer;

impl CdrDeserializer {
    /// Create a new deserializer.
    pub fn new() -> Self {
        Self
    }

    /// Decode a CDR payload (encapsulation header included).
    pub fn decode(&self, descriptor: &TypeDescriptor, data: &[u8]) -> Result<Fields> {
        let root = descriptor
            .root()
            .ok_or_else(|| BagError::type_resolution(descriptor.type_name()))?;
        let mut cursor = CdrCursor::new(data)?;
        self.read_struct(&mut cursor, descriptor, root, 0)
    }

    fn read_struct(
        &self,
        cursor: &mut CdrCursor<'_>,
        descriptor: &TypeDescriptor,
        msg_type: &MessageType,
        depth: usize,
    ) -> Result<Fields> {
        if depth > MAX_DEPTH {
            return Err(BagError::Other(format!(
                "Maximum nesting depth ({MAX_DEPTH}) exceeded in '{}'",
                msg_type.name
            )));
        }

        // Nested empty structs carry a one-byte placeholder on the wire.
        if msg_type.fields.is_empty() && depth > 0 {
            cursor.read_u8()?;
            return Ok(Fields::new());
        }

        let mut fields = Fields::with_capacity(msg_type.fields.len());
        for field in &msg_type.fields {
            let value = self.read_field(cursor, descriptor, &field.type_name, depth)?;
            fields.insert(field.name.clone(), value);
        }
        Ok(fields)
    }

    fn read_field(
        &self,
        cursor: &mut CdrCursor<'_>,
        descriptor: &TypeDescriptor,
        field_type: &FieldType,
        depth: usize,
    ) -> Result<CodecValue> {
        match field_type {
            FieldType::Primitive(prim) => read_primitive(cursor, *prim),
            FieldType::Nested(type_name) => {
                let nested = descriptor
                    .get_type(type_name)
                    .ok_or_else(|| BagError::type_resolution(type_name.clone()))?;
                Ok(CodecValue::Struct(self.read_struct(
                    cursor,
                    descriptor,
                    nested,
                    depth + 1,
                )?))
            }
            FieldType::Array { base_type, size } => {
                self.read_array(cursor, descriptor, base_type, *size, depth)
            }
        }
    }

    fn read_array(
        &self,
        cursor: &mut CdrCursor<'_>,
        descriptor: &TypeDescriptor,
        element: &FieldType,
        size: Option<usize>,
        depth: usize,
    ) -> Result<CodecValue> {
        let count = match size {
            Some(n) => n,
            None => read_length(cursor)?,
        };

        if let FieldType::Primitive(prim) = element {
            if prim.is_octet() {
                return Ok(CodecValue::Bytes(cursor.read_bytes(count)?.to_vec()));
            }
            // Fixed-size elements: reject impossible counts before allocating.
            if let Some(width) = prim.size() {
                if count.saturating_mul(width) > cursor.remaining() {
                    return Err(BagError::length_exceeded(
                        count,
                        cursor.position(),
                        cursor.len(),
                    ));
                }
            }
        }

        let mut values = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            values.push(self.read_field(cursor, descriptor, element, depth)?);
        }
        Ok(CodecValue::Array(values))
    }
}

impl Deserializer for CdrDeserializer {
    fn to_fields(&self, payload: &[u8], descriptor: &TypeDescriptor) -> Result<Fields> {
        self.decode(descriptor, payload)
    }
}

/// Read a sequence or string length prefix and bound-check it.
fn read_length(cursor: &mut CdrCursor<'_>) -> Result<usize> {
    let position = cursor.position();
    let len = cursor.read_u32()? as usize;
    if len > MAX_ARRAY_LENGTH {
        return Err(BagError::length_exceeded(len, position, cursor.len()));
    }
    Ok(len)
}

fn read_primitive(cursor: &mut CdrCursor<'_>, prim: PrimitiveType) -> Result<CodecValue> {
    Ok(match prim {
        PrimitiveType::Bool => CodecValue::Bool(cursor.read_u8()? != 0),
        PrimitiveType::Int8 => CodecValue::Int8(cursor.read_i8()?),
        PrimitiveType::Int16 => CodecValue::Int16(cursor.read_i16()?),
        PrimitiveType::Int32 => CodecValue::Int32(cursor.read_i32()?),
        PrimitiveType::Int64 => CodecValue::Int64(cursor.read_i64()?),
        PrimitiveType::UInt8 | PrimitiveType::Byte | PrimitiveType::Char => {
            CodecValue::UInt8(cursor.read_u8()?)
        }
        PrimitiveType::UInt16 => CodecValue::UInt16(cursor.read_u16()?),
        PrimitiveType::UInt32 => CodecValue::UInt32(cursor.read_u32()?),
        PrimitiveType::UInt64 => CodecValue::UInt64(cursor.read_u64()?),
        PrimitiveType::Float32 => CodecValue::Float32(cursor.read_f32()?),
        PrimitiveType::Float64 => CodecValue::Float64(cursor.read_f64()?),
        PrimitiveType::String => read_string(cursor)?,
        PrimitiveType::WString => read_wstring(cursor)?,
    })
}

/// Strings carry a length that counts the trailing NUL.
fn read_string(cursor: &mut CdrCursor<'_>) -> Result<CodecValue> {
    let position = cursor.position();
    let len = read_length(cursor)?;
    if len > cursor.remaining() {
        return Err(BagError::length_exceeded(len, position, cursor.len()));
    }
    let bytes = cursor.read_bytes(len)?;
    let text = match bytes.split_last() {
        Some((0, rest)) => rest,
        _ => bytes,
    };
    Ok(CodecValue::String(String::from_utf8_lossy(text).into_owned()))
}

/// Wide strings carry a count of UTF-16 code units, no terminator.
fn read_wstring(cursor: &mut CdrCursor<'_>) -> Result<CodecValue> {
    let position = cursor.position();
    let len = read_length(cursor)?;
    if len.saturating_mul(2) > cursor.remaining() {
        return Err(BagError::length_exceeded(len, position, cursor.len()));
    }
    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(cursor.read_u16()?);
    }
    Ok(CodecValue::String(String::from_utf16_lossy(&units)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TypeRegistry;

    fn descriptor(name: &str, definition: &str) -> TypeDescriptor {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        registry.register_definition(name, definition).unwrap();
        registry.resolve(name).unwrap()
    }

    fn le_header() -> Vec<u8> {
        vec![0x00, 0x01, 0x00, 0x00]
    }

    #[test]
    fn test_decode_int32() {
        let mut data = le_header();
        data.extend_from_slice(&(-7i32).to_le_bytes());

        let fields = CdrDeserializer::new()
            .decode(&descriptor("t/msg/I", "int32 value"), &data)
            .unwrap();
        assert_eq!(fields.get("value"), Some(&CodecValue::Int32(-7)));
    }

    #[test]
    fn test_decode_string_strips_nul() {
        let mut data = le_header();
        data.extend_from_slice(&13u32.to_le_bytes());
        data.extend_from_slice(b"Hello World!\0");

        let fields = CdrDeserializer::new()
            .decode(&descriptor("t/msg/S", "string data"), &data)
            .unwrap();
        assert_eq!(fields.get("data"), Some(&"Hello World!".into()));
    }

    #[test]
    fn test_decode_multiple_fields_with_padding() {
        let mut data = le_header();
        data.push(1); // bool
        data.extend_from_slice(&[0; 7]); // pad to 8
        data.extend_from_slice(&2.5f64.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());

        let fields = CdrDeserializer::new()
            .decode(&descriptor("t/msg/M", "bool flag\nfloat64 x\nuint16 n"), &data)
            .unwrap();
        let keys: Vec<&str> = fields.keys().collect();
        assert_eq!(keys, vec!["flag", "x", "n"]);
        assert_eq!(fields.get("flag"), Some(&CodecValue::Bool(true)));
        assert_eq!(fields.get("x"), Some(&CodecValue::Float64(2.5)));
        assert_eq!(fields.get("n"), Some(&CodecValue::UInt16(3)));
    }

    #[test]
    fn test_decode_sequences_and_fixed_arrays() {
        let mut data = le_header();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&10i32.to_le_bytes());
        data.extend_from_slice(&20i32.to_le_bytes());
        data.extend_from_slice(&[7, 8]); // uint8[2]
        data.extend_from_slice(&[0, 0]); // pad
        data.extend_from_slice(&3u32.to_le_bytes()); // byte[] length
        data.extend_from_slice(&[1, 2, 3]);

        let fields = CdrDeserializer::new()
            .decode(
                &descriptor("t/msg/A", "int32[] seq\nuint8[2] pair\nbyte[] blob"),
                &data,
            )
            .unwrap();
        assert_eq!(
            fields.get("seq"),
            Some(&CodecValue::Array(vec![
                CodecValue::Int32(10),
                CodecValue::Int32(20)
            ]))
        );
        assert_eq!(fields.get("pair"), Some(&CodecValue::Bytes(vec![7, 8])));
        assert_eq!(fields.get("blob"), Some(&CodecValue::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn test_decode_nested_header() {
        let mut data = le_header();
        data.extend_from_slice(&5i32.to_le_bytes());
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"map\0");
        data.extend_from_slice(&1.0f64.to_le_bytes());

        let fields = CdrDeserializer::new()
            .decode(&descriptor("t/msg/H", "std_msgs/Header header\nfloat64 v"), &data)
            .unwrap();
        assert_eq!(
            fields.get_path("header.stamp.nanosec"),
            Some(&CodecValue::UInt32(6))
        );
        assert_eq!(fields.get_path("header.frame_id"), Some(&"map".into()));
        assert_eq!(fields.get("v"), Some(&CodecValue::Float64(1.0)));
    }

    #[test]
    fn test_decode_wstring() {
        let mut data = le_header();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&('h' as u16).to_le_bytes());
        data.extend_from_slice(&('i' as u16).to_le_bytes());

        let fields = CdrDeserializer::new()
            .decode(&descriptor("t/msg/W", "wstring text"), &data)
            .unwrap();
        assert_eq!(fields.get("text"), Some(&"hi".into()));
    }

    #[test]
    fn test_decode_big_endian() {
        let mut data = vec![0x00, 0x00, 0x00, 0x00];
        data.extend_from_slice(&258i32.to_be_bytes());

        let fields = CdrDeserializer::new()
            .decode(&descriptor("t/msg/B", "int32 value"), &data)
            .unwrap();
        assert_eq!(fields.get("value"), Some(&CodecValue::Int32(258)));
    }

    #[test]
    fn test_decode_truncated_payload() {
        let mut data = le_header();
        data.extend_from_slice(&[1, 0]);

        let err = CdrDeserializer::new()
            .decode(&descriptor("t/msg/T", "int32 value"), &data)
            .unwrap_err();
        assert!(matches!(err, BagError::BufferTooShort { .. }));
    }

    #[test]
    fn test_decode_string_too_long() {
        let mut data = le_header();
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(b"abc\0");

        let err = CdrDeserializer::new()
            .decode(&descriptor("t/msg/S", "string data"), &data)
            .unwrap_err();
        assert!(matches!(err, BagError::LengthExceeded { length: 100, .. }));
    }

    #[test]
    fn test_decode_array_too_long() {
        let mut data = le_header();
        data.extend_from_slice(&u32::MAX.to_le_bytes());

        let err = CdrDeserializer::new()
            .decode(&descriptor("t/msg/A", "float64[] values"), &data)
            .unwrap_err();
        assert!(matches!(err, BagError::LengthExceeded { .. }));
    }

    #[test]
    fn test_decode_nested_empty_struct_placeholder() {
        // placeholder byte, three bytes of padding, then x
        let mut data = le_header();
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&7i32.to_le_bytes());

        let fields = CdrDeserializer::new()
            .decode(&descriptor("p/msg/E", "std_msgs/Empty e\nint32 x"), &data)
            .unwrap();
        assert_eq!(fields.get("e"), Some(&CodecValue::Struct(Fields::new())));
        assert_eq!(fields.get("x"), Some(&CodecValue::Int32(7)));
    }

    #[test]
    fn test_decode_array_of_empty_structs() {
        let mut data = le_header();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0x00, 0x00]);
        data.push(5);

        let fields = CdrDeserializer::new()
            .decode(
                &descriptor("p/msg/L", "std_msgs/Empty[] items\nuint8 tail"),
                &data,
            )
            .unwrap();
        assert_eq!(
            fields.get("items"),
            Some(&CodecValue::Array(vec![
                CodecValue::Struct(Fields::new()),
                CodecValue::Struct(Fields::new()),
            ]))
        );
        assert_eq!(fields.get("tail"), Some(&CodecValue::UInt8(5)));
    }

    #[test]
    fn test_decode_top_level_empty_message() {
        let fields = CdrDeserializer::new()
            .decode(&descriptor("p/msg/Nothing", ""), &le_header())
            .unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_deserializer_trait() {
        let mut data = le_header();
        data.push(1);
        let deserializer: &dyn Deserializer = &CdrDeserializer::new();
        let fields = deserializer
            .to_fields(&data, &descriptor("t/msg/B", "bool ok"))
            .unwrap();
        assert_eq!(fields.get("ok"), Some(&CodecValue::Bool(true)));
    }
}
