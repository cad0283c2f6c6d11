// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Error conversion between Rust and Python.
//!
//! Every [`BagError`] becomes a `BagRecordError`, or one of its subclasses
//! for the errors callers usually handle. The exception arguments are a
//! `(kind, context, message)` tuple.

use pyo3::prelude::*;

use crate::core::BagError;

pyo3::create_exception!(_bagrecord, BagRecordError, pyo3::exceptions::PyException);
pyo3::create_exception!(_bagrecord, OpenError, BagRecordError);
pyo3::create_exception!(_bagrecord, NotOpenError, BagRecordError);
pyo3::create_exception!(_bagrecord, TopicResolutionError, BagRecordError);
pyo3::create_exception!(_bagrecord, SpecificationFormatError, BagRecordError);
pyo3::create_exception!(_bagrecord, TypeResolutionError, BagRecordError);
pyo3::create_exception!(_bagrecord, DeserializationError, BagRecordError);
pyo3::create_exception!(_bagrecord, ReservedKeyCollisionError, BagRecordError);

/// Convert a BagError to a structured (kind, context, message) tuple.
fn bag_error_to_tuple(err: &BagError) -> (String, Option<String>, String) {
    let context = match err {
        BagError::Open { path, .. } => Some(path.clone()),
        BagError::TopicResolution { topic } => Some(topic.clone()),
        BagError::SpecificationFormat { specification, .. } => Some(specification.clone()),
        BagError::TypeResolution { type_name } => Some(type_name.clone()),
        BagError::Deserialization { topic, .. } | BagError::ReservedKeyCollision { topic, .. } => {
            Some(topic.clone())
        }
        BagError::Storage { context, .. } | BagError::Parse { context, .. } => {
            Some(context.clone())
        }
        _ => None,
    };
    let kind = match err {
        BagError::Open { .. } => "Open",
        BagError::NotOpen => "NotOpen",
        BagError::TopicResolution { .. } => "TopicResolution",
        BagError::SpecificationFormat { .. } => "SpecificationFormat",
        BagError::TypeResolution { .. } => "TypeResolution",
        BagError::Deserialization { .. }
        | BagError::BufferTooShort { .. }
        | BagError::LengthExceeded { .. } => "Deserialization",
        BagError::ReservedKeyCollision { .. } => "ReservedKeyCollision",
        BagError::Storage { .. } => "Storage",
        BagError::Parse { .. } => "Parse",
        BagError::TypeMismatch { .. } => "TypeMismatch",
        BagError::Config(_) => "Config",
        BagError::Io(_) => "Io",
        BagError::Other(_) => "Error",
    };
    (kind.to_string(), context, err.to_string())
}

impl From<BagError> for PyErr {
    fn from(err: BagError) -> Self {
        let args = bag_error_to_tuple(&err);
        match err {
            BagError::Open { .. } | BagError::Config(_) => PyErr::new::<OpenError, _>(args),
            BagError::NotOpen => PyErr::new::<NotOpenError, _>(args),
            BagError::TopicResolution { .. } => PyErr::new::<TopicResolutionError, _>(args),
            BagError::SpecificationFormat { .. } => {
                PyErr::new::<SpecificationFormatError, _>(args)
            }
            BagError::TypeResolution { .. } => PyErr::new::<TypeResolutionError, _>(args),
            BagError::Deserialization { .. }
            | BagError::BufferTooShort { .. }
            | BagError::LengthExceeded { .. } => PyErr::new::<DeserializationError, _>(args),
            BagError::ReservedKeyCollision { .. } => {
                PyErr::new::<ReservedKeyCollisionError, _>(args)
            }
            _ => PyErr::new::<BagRecordError, _>(args),
        }
    }
}

/// Convert a Rust `Result` to a Python `PyResult`.
pub fn to_py_result<T>(result: crate::Result<T>) -> PyResult<T> {
    result.map_err(PyErr::from)
}

/// Register the exception classes on the module.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("BagRecordError", py.get_type::<BagRecordError>())?;
    m.add("OpenError", py.get_type::<OpenError>())?;
    m.add("NotOpenError", py.get_type::<NotOpenError>())?;
    m.add("TopicResolutionError", py.get_type::<TopicResolutionError>())?;
    m.add(
        "SpecificationFormatError",
        py.get_type::<SpecificationFormatError>(),
    )?;
    m.add("TypeResolutionError", py.get_type::<TypeResolutionError>())?;
    m.add("DeserializationError", py.get_type::<DeserializationError>())?;
    m.add(
        "ReservedKeyCollisionError",
        py.get_type::<ReservedKeyCollisionError>(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tuple_open() {
        let err = BagError::open("talker", "file does not exist");
        let (kind, context, message) = bag_error_to_tuple(&err);
        assert_eq!(kind, "Open");
        assert_eq!(context, Some("talker".to_string()));
        assert_eq!(message, "Failed to open 'talker': file does not exist");
    }

    #[test]
    fn test_error_tuple_specification_format() {
        let err = BagError::specification_format("bad/spec", 2);
        let (kind, context, _message) = bag_error_to_tuple(&err);
        assert_eq!(kind, "SpecificationFormat");
        assert_eq!(context, Some("bad/spec".to_string()));
    }

    #[test]
    fn test_error_to_pyerr_subclass() {
        Python::with_gil(|py| {
            let py_err: PyErr = BagError::NotOpen.into();
            assert!(py_err.is_instance_of::<NotOpenError>(py));
            assert!(py_err.is_instance_of::<BagRecordError>(py));

            let py_err: PyErr = BagError::storage("sqlite3", "locked").into();
            assert!(py_err.is_instance_of::<BagRecordError>(py));
            assert!(!py_err.is_instance_of::<OpenError>(py));
        });
    }
}
