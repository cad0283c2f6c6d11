// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR encoder for writing CDR-encoded data.
//!
//! The encoder mirrors [`CdrCursor`](super::cursor::CdrCursor): alignment is
//! relative to the first byte after the encapsulation header, and nested
//! structs do not move the origin.

use super::cursor::CDR_HEADER_SIZE;
use crate::core::{BagError, CodecValue, Fields, Result};
use crate::schema::{FieldType, PrimitiveType, TypeDescriptor};

/// Default initial capacity for the encoder buffer.
const DEFAULT_CAPACITY: usize = 64;

/// CDR encapsulation kind (XCDR1 plain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EncapsulationKind {
    /// CDR, Little Endian
    #[default]
    CdrLe = 0x01,
    /// CDR, Big Endian
    CdrBe = 0x00,
}

impl EncapsulationKind {
    /// Check if this encapsulation uses little endian byte order.
    #[must_use]
    pub const fn is_little_endian(self) -> bool {
        matches!(self, Self::CdrLe)
    }
}

/// CDR encoder for writing CDR-encoded data.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bagrecord::encoding::cdr::encoder::CdrEncoder;
///
/// let mut encoder = CdrEncoder::new();
/// encoder.string("Hello World!")?;
/// let data = encoder.finish();
/// assert_eq!(data.len(), 4 + 4 + 13);
/// # Ok(())
/// # }
/// ```
pub struct CdrEncoder {
    /// Output buffer, header included
    buffer: Vec<u8>,
    /// Encapsulation kind
    kind: EncapsulationKind,
}

impl Default for CdrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CdrEncoder {
    /// Create a new encoder with default settings (CDR, little-endian).
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(EncapsulationKind::default())
    }

    /// Create a new encoder with the specified encapsulation kind.
    #[must_use]
    pub fn with_kind(kind: EncapsulationKind) -> Self {
        let mut buffer = Vec::with_capacity(DEFAULT_CAPACITY);
        buffer.push(0); // Unused
        buffer.push(kind as u8); // Encapsulation kind
        buffer.push(0); // Options (unused)
        buffer.push(0); // Options (unused)
        Self { buffer, kind }
    }

    /// Get the encapsulation kind.
    #[must_use]
    pub const fn kind(&self) -> EncapsulationKind {
        self.kind
    }

    /// Get the current size of the encoded data.
    #[must_use]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Get a reference to the encoded data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the encoder and return the encoded data.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    /// Reset the encoder to write a new message.
    pub fn reset(&mut self) {
        self.buffer.truncate(CDR_HEADER_SIZE);
    }

    /// Pad with zeros to `size`, relative to the end of the header.
    fn align(&mut self, size: usize) {
        let alignment = (self.buffer.len() - CDR_HEADER_SIZE) % size;
        if alignment > 0 {
            self.buffer.resize(self.buffer.len() + size - alignment, 0);
        }
    }

    fn put<const N: usize>(&mut self, le: [u8; N], be: [u8; N]) -> Result<&mut Self> {
        self.align(N);
        if self.kind.is_little_endian() {
            self.buffer.extend_from_slice(&le);
        } else {
            self.buffer.extend_from_slice(&be);
        }
        Ok(self)
    }

    /// Write a boolean.
    pub fn bool(&mut self, value: bool) -> Result<&mut Self> {
        self.uint8(u8::from(value))
    }

    /// Write an 8-bit signed integer.
    pub fn int8(&mut self, value: i8) -> Result<&mut Self> {
        self.buffer.push(value as u8);
        Ok(self)
    }

    /// Write an 8-bit unsigned integer.
    pub fn uint8(&mut self, value: u8) -> Result<&mut Self> {
        self.buffer.push(value);
        Ok(self)
    }

    /// Write a 16-bit signed integer.
    pub fn int16(&mut self, value: i16) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 16-bit unsigned integer.
    pub fn uint16(&mut self, value: u16) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 32-bit signed integer.
    pub fn int32(&mut self, value: i32) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 32-bit unsigned integer.
    pub fn uint32(&mut self, value: u32) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 64-bit signed integer.
    pub fn int64(&mut self, value: i64) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 64-bit unsigned integer.
    pub fn uint64(&mut self, value: u64) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 32-bit float.
    pub fn float32(&mut self, value: f32) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a 64-bit float.
    pub fn float64(&mut self, value: f64) -> Result<&mut Self> {
        self.put(value.to_le_bytes(), value.to_be_bytes())
    }

    /// Write a string with its NUL-inclusive length prefix.
    pub fn string(&mut self, value: &str) -> Result<&mut Self> {
        self.sequence_length(value.len() + 1)?;
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.push(0);
        Ok(self)
    }

    /// Write a wide string as UTF-16 code units.
    pub fn wstring(&mut self, value: &str) -> Result<&mut Self> {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.sequence_length(units.len())?;
        for unit in units {
            self.uint16(unit)?;
        }
        Ok(self)
    }

    /// Write a sequence length (for dynamic arrays).
    pub fn sequence_length(&mut self, value: usize) -> Result<&mut Self> {
        let len = u32::try_from(value)
            .map_err(|_| BagError::length_exceeded(value, self.buffer.len(), u32::MAX as usize))?;
        self.uint32(len)
    }

    /// Write raw bytes.
    pub fn bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.buffer.extend_from_slice(data);
        Ok(self)
    }

    /// Encode a message against its descriptor.
    ///
    /// Every declared field must be present in `message`; extra entries are
    /// ignored.
    pub fn encode_message(&mut self, message: &Fields, descriptor: &TypeDescriptor) -> Result<()> {
        let root = descriptor
            .root()
            .ok_or_else(|| BagError::type_resolution(descriptor.type_name()))?;
        self.encode_struct(message, &root.name, descriptor)
    }

    fn encode_struct(
        &mut self,
        message: &Fields,
        type_name: &str,
        descriptor: &TypeDescriptor,
    ) -> Result<()> {
        let msg_type = descriptor
            .get_type(type_name)
            .ok_or_else(|| BagError::type_resolution(type_name))?;
        for field in &msg_type.fields {
            let value = message.get(&field.name).ok_or_else(|| {
                BagError::type_mismatch(&field.name, describe(&field.type_name), "missing")
            })?;
            self.encode_value(&field.name, value, &field.type_name, descriptor)?;
        }
        Ok(())
    }

    fn encode_value(
        &mut self,
        name: &str,
        value: &CodecValue,
        field_type: &FieldType,
        descriptor: &TypeDescriptor,
    ) -> Result<()> {
        match (field_type, value) {
            (FieldType::Primitive(prim), _) => self.encode_primitive(name, value, *prim),
            (FieldType::Nested(type_name), CodecValue::Struct(inner)) => {
                let nested = descriptor
                    .get_type(type_name)
                    .ok_or_else(|| BagError::type_resolution(type_name.clone()))?;
                // Nested empty structs carry a one-byte placeholder on the wire.
                if nested.fields.is_empty() {
                    self.uint8(0)?;
                    return Ok(());
                }
                self.encode_struct(inner, type_name, descriptor)
            }
            (FieldType::Array { base_type, size }, CodecValue::Bytes(bytes))
                if matches!(**base_type, FieldType::Primitive(p) if p.is_octet()) =>
            {
                self.check_fixed(name, *size, bytes.len())?;
                if size.is_none() {
                    self.sequence_length(bytes.len())?;
                }
                self.bytes(bytes)?;
                Ok(())
            }
            (FieldType::Array { base_type, size }, CodecValue::Array(items)) => {
                self.check_fixed(name, *size, items.len())?;
                if size.is_none() {
                    self.sequence_length(items.len())?;
                }
                for item in items {
                    self.encode_value(name, item, base_type, descriptor)?;
                }
                Ok(())
            }
            _ => Err(BagError::type_mismatch(
                name,
                describe(field_type),
                value.type_name(),
            )),
        }
    }

    fn check_fixed(&self, name: &str, size: Option<usize>, actual: usize) -> Result<()> {
        match size {
            Some(expected) if expected != actual => Err(BagError::type_mismatch(
                name,
                format!("{expected} elements"),
                format!("{actual} elements"),
            )),
            _ => Ok(()),
        }
    }

    fn encode_primitive(&mut self, name: &str, value: &CodecValue, prim: PrimitiveType) -> Result<()> {
        let mismatch = || BagError::type_mismatch(name, prim.as_str(), value.type_name());
        match (prim, value) {
            (PrimitiveType::Bool, CodecValue::Bool(v)) => self.bool(*v)?,
            (PrimitiveType::String, CodecValue::String(s)) => self.string(s)?,
            (PrimitiveType::WString, CodecValue::String(s)) => self.wstring(s)?,
            (PrimitiveType::Float32, v) => self.float32(v.as_f64().ok_or_else(mismatch)? as f32)?,
            (PrimitiveType::Float64, v) => self.float64(v.as_f64().ok_or_else(mismatch)?)?,
            (PrimitiveType::UInt64, CodecValue::UInt64(v)) => self.uint64(*v)?,
            (_, v) if v.is_integer() => {
                let n = v.as_i64().ok_or_else(mismatch)?;
                match prim {
                    PrimitiveType::Int8 => self.int8(i8::try_from(n).map_err(|_| mismatch())?)?,
                    PrimitiveType::Int16 => self.int16(i16::try_from(n).map_err(|_| mismatch())?)?,
                    PrimitiveType::Int32 => self.int32(i32::try_from(n).map_err(|_| mismatch())?)?,
                    PrimitiveType::Int64 => self.int64(n)?,
                    PrimitiveType::UInt8 | PrimitiveType::Byte | PrimitiveType::Char => {
                        self.uint8(u8::try_from(n).map_err(|_| mismatch())?)?
                    }
                    PrimitiveType::UInt16 => {
                        self.uint16(u16::try_from(n).map_err(|_| mismatch())?)?
                    }
                    PrimitiveType::UInt32 => {
                        self.uint32(u32::try_from(n).map_err(|_| mismatch())?)?
                    }
                    PrimitiveType::UInt64 => {
                        self.uint64(u64::try_from(n).map_err(|_| mismatch())?)?
                    }
                    _ => return Err(mismatch()),
                }
            }
            _ => return Err(mismatch()),
        };
        Ok(())
    }
}

fn describe(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Primitive(p) => p.as_str().to_string(),
        FieldType::Array { base_type, size } => match size {
            Some(n) => format!("{}[{n}]", describe(base_type)),
            None => format!("{}[]", describe(base_type)),
        },
        FieldType::Nested(name) => name.clone(),
    }
}
