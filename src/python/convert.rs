// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type conversion between Rust and Python.

use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyList};
use pyo3::IntoPyObjectExt;

use crate::core::{CodecValue, Fields};

/// Convert a numeric or string value to its Python counterpart.
macro_rules! convert_scalar {
    ($py:expr, $value:expr) => {
        Ok($value.into_py_any($py)?.into_bound($py))
    };
}

/// Convert a `CodecValue` to a native Python type.
///
/// # Mapping
///
/// - `Bool` → `bool`
/// - `Int8/16/32/64`, `UInt8/16/32/64` → `int`
/// - `Float32/64` → `float`
/// - `String` → `str`
/// - `Bytes` → `bytes`
/// - `Array` → `list`
/// - `Struct` → `dict`
/// - `Null` → `None`
pub fn codec_value_to_py<'py>(py: Python<'py>, value: &CodecValue) -> PyResult<Bound<'py, PyAny>> {
    match value {
        CodecValue::Bool(v) => convert_scalar!(py, *v),

        CodecValue::Int8(v) => convert_scalar!(py, *v),
        CodecValue::Int16(v) => convert_scalar!(py, *v),
        CodecValue::Int32(v) => convert_scalar!(py, *v),
        CodecValue::Int64(v) => convert_scalar!(py, *v),

        CodecValue::UInt8(v) => convert_scalar!(py, *v),
        CodecValue::UInt16(v) => convert_scalar!(py, *v),
        CodecValue::UInt32(v) => convert_scalar!(py, *v),
        CodecValue::UInt64(v) => convert_scalar!(py, *v),

        CodecValue::Float32(v) => convert_scalar!(py, *v as f64),
        CodecValue::Float64(v) => convert_scalar!(py, *v),

        CodecValue::String(v) => convert_scalar!(py, v.as_str()),

        CodecValue::Bytes(v) => Ok(PyBytes::new(py, v.as_slice()).into_any()),

        CodecValue::Array(items) => {
            let py_list = PyList::empty(py);
            for item in items {
                py_list.append(codec_value_to_py(py, item)?)?;
            }
            Ok(py_list.into_any())
        }

        CodecValue::Struct(fields) => fields_to_py(py, fields).map(|x| x.into_any()),

        CodecValue::Null => Ok(py.None().into_bound(py)),
    }
}

/// Convert [`Fields`] to a Python dict, keeping field order.
pub fn fields_to_py<'py>(py: Python<'py>, fields: &Fields) -> PyResult<Bound<'py, PyDict>> {
    let py_dict = PyDict::new(py);
    for (key, value) in fields.iter() {
        py_dict.set_item(key, codec_value_to_py(py, value)?)?;
    }
    Ok(py_dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_scalars() {
        Python::with_gil(|py| {
            let result = codec_value_to_py(py, &CodecValue::Bool(true)).unwrap();
            assert!(result.extract::<bool>().unwrap());

            let result = codec_value_to_py(py, &CodecValue::UInt64(4_200_000_000)).unwrap();
            assert_eq!(result.extract::<u64>().unwrap(), 4_200_000_000);

            let result = codec_value_to_py(py, &CodecValue::Float32(1.5)).unwrap();
            assert!((result.extract::<f64>().unwrap() - 1.5).abs() < 0.001);

            let result = codec_value_to_py(py, &CodecValue::Null).unwrap();
            assert!(result.is_none());
        });
    }

    #[test]
    fn test_convert_bytes() {
        Python::with_gil(|py| {
            let data = vec![1u8, 2, 3, 4];
            let result = codec_value_to_py(py, &CodecValue::Bytes(data.clone())).unwrap();
            assert_eq!(result.extract::<Vec<u8>>().unwrap(), data);
        });
    }

    #[test]
    fn test_fields_keep_order() {
        Python::with_gil(|py| {
            let inner: Fields = [("x", CodecValue::Float64(1.0))].into_iter().collect();
            let fields: Fields = [
                ("topic", CodecValue::from("/pose")),
                ("position", CodecValue::Struct(inner)),
                ("ids", CodecValue::Array(vec![CodecValue::Int32(1)])),
            ]
            .into_iter()
            .collect();
            let dict = fields_to_py(py, &fields).unwrap();
            let keys: Vec<String> = dict.keys().extract().unwrap();
            assert_eq!(keys, vec!["topic", "position", "ids"]);

            let position = dict.get_item("position").unwrap().unwrap();
            assert!(position.downcast::<PyDict>().is_ok());
            let ids = dict.get_item("ids").unwrap().unwrap();
            assert!(ids.downcast::<PyList>().is_ok());
        });
    }
}
