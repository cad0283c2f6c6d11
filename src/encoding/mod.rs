// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message deserialization.
//!
//! A [`Deserializer`] turns a serialized payload plus a resolved
//! [`TypeDescriptor`] into an ordered [`Fields`] mapping. [`cdr`] provides the
//! only implementation; [`to_record`] and [`to_payload`] are conveniences that
//! resolve the type through a [`TypeRegistry`] first.

pub mod cdr;

pub use cdr::{CdrDeserializer, CdrEncoder};

use crate::core::{Fields, Result, TypeRegistry};
use crate::schema::TypeDescriptor;

/// Converts serialized payloads into field mappings.
pub trait Deserializer {
    /// Decode `payload` as an instance of `descriptor`.
    fn to_fields(&self, payload: &[u8], descriptor: &TypeDescriptor) -> Result<Fields>;
}

/// Decode a CDR payload of type `type_name` into a field mapping.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bagrecord::core::{CodecValue, Fields, TypeRegistry};
/// use bagrecord::encoding::{to_payload, to_record};
///
/// let registry = TypeRegistry::with_builtin_types()?;
/// let message: Fields = [("data", CodecValue::from("Hello World!"))].into_iter().collect();
/// let payload = to_payload(&message, "example_interfaces/msg/String", &registry)?;
///
/// let fields = to_record(&payload, "example_interfaces/msg/String", &registry)?;
/// assert_eq!(fields.get("data").and_then(|v| v.as_str()), Some("Hello World!"));
/// # Ok(())
/// # }
/// ```
pub fn to_record(payload: &[u8], type_name: &str, registry: &TypeRegistry) -> Result<Fields> {
    let descriptor = registry.resolve(type_name)?;
    CdrDeserializer::new().to_fields(payload, &descriptor)
}

/// Encode a field mapping of type `type_name` as a little-endian CDR payload.
pub fn to_payload(message: &Fields, type_name: &str, registry: &TypeRegistry) -> Result<Vec<u8>> {
    let descriptor = registry.resolve(type_name)?;
    let mut encoder = CdrEncoder::new();
    encoder.encode_message(message, &descriptor)?;
    Ok(encoder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BagError, CodecValue};

    #[test]
    fn test_to_record_resolves_type() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        let message: Fields = [("data", CodecValue::Int32(12))].into_iter().collect();
        let payload = to_payload(&message, "std_msgs/msg/Int32", &registry).unwrap();

        let fields = to_record(&payload, "std_msgs/msg/Int32", &registry).unwrap();
        assert_eq!(fields, message);
    }

    #[test]
    fn test_to_record_unknown_type() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        let err = to_record(&[0, 1, 0, 0], "pkg/msg/Nope", &registry).unwrap_err();
        assert!(matches!(err, BagError::TypeResolution { .. }));
    }
}
