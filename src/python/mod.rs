// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Python bindings via PyO3.
//!
//! # Python API
//!
//! ```python
//! import bagrecord
//!
//! reader = bagrecord.Reader("run.mcap", storage_id="mcap")
//! for topic, type_name in reader.type_map.items():
//!     print(topic, type_name)
//!
//! try:
//!     records = reader.records
//! except bagrecord.DeserializationError as e:
//!     kind, context, message = e.args
//! ```

use pyo3::prelude::*;

pub mod convert;
pub mod error;
pub mod reader;

pub use error::BagRecordError;
pub use reader::PyReader;

/// Python module for reading ROS 2 recordings.
#[pymodule]
fn _bagrecord(m: &Bound<'_, PyModule>) -> PyResult<()> {
    error::register(m)?;
    m.add_class::<PyReader>()?;
    m.add("RESERVED_KEYS", crate::io::RESERVED_KEYS.to_vec())?;
    Ok(())
}
