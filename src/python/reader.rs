// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Python bindings for BagReader.

use std::collections::HashMap;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::io::BagReader;

use super::convert::fields_to_py;
use super::error::to_py_result;

/// Record reader over a ROS 2 recording.
///
/// Records are dicts whose first keys are `topic`, `time_ns` and `type`,
/// followed by the message fields. Nested messages are nested dicts.
///
/// # Example
///
/// ```python
/// import bagrecord
///
/// reader = bagrecord.Reader("talker", topics=["/chatter"])
/// print(reader.type_map)
/// for record in reader:
///     print(record["time_ns"], record["data"])
/// ```
#[pyclass(name = "Reader", unsendable)]
pub struct PyReader {
    inner: BagReader,
}

#[pymethods]
impl PyReader {
    /// Create a reader, opening `path` when given.
    ///
    /// Parameters
    /// ----------
    /// path : str or None
    ///     Recording file or bag directory
    /// topics : list[str] or None
    ///     Topic filter installed after opening `path`
    /// storage_id : str
    ///     "sqlite3" (default) or "mcap"
    /// serialization_format : str
    ///     Payload serialization, only "cdr" is supported
    /// message_paths : list[str] or None
    ///     Directories searched for .msg files
    ///
    /// Raises
    /// ------
    /// OpenError
    ///     If the recording cannot be opened
    #[new]
    #[pyo3(signature = (path=None, topics=None, storage_id="sqlite3", serialization_format="cdr", message_paths=None))]
    fn new(
        path: Option<&str>,
        topics: Option<Vec<String>>,
        storage_id: &str,
        serialization_format: &str,
        message_paths: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let mut inner = to_py_result(BagReader::new())?;
        for dir in message_paths.unwrap_or_default() {
            to_py_result(inner.add_message_path(dir))?;
        }
        if let Some(path) = path {
            to_py_result(inner.open(path, storage_id, serialization_format))?;
        }
        let topics = topics.unwrap_or_default();
        if !topics.is_empty() {
            to_py_result(inner.set_filter(topics))?;
        }
        Ok(Self { inner })
    }

    /// Open a recording, closing any recording already open.
    #[pyo3(signature = (path, storage_id="sqlite3", serialization_format="cdr"))]
    fn open(&mut self, path: &str, storage_id: &str, serialization_format: &str) -> PyResult<()> {
        to_py_result(self.inner.open(path, storage_id, serialization_format))
    }

    /// Close the recording.
    fn close(&mut self) {
        self.inner.close();
    }

    /// Whether a recording is open.
    #[getter]
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Add a directory searched for .msg files.
    fn add_message_path(&mut self, path: &str) -> PyResult<()> {
        to_py_result(self.inner.add_message_path(path))
    }

    /// Topic names in the recording.
    #[getter]
    fn topics(&self) -> PyResult<Vec<String>> {
        to_py_result(self.inner.topics())
    }

    /// Mapping of topic name to message type.
    #[getter]
    fn type_map(&self) -> PyResult<HashMap<String, String>> {
        to_py_result(self.inner.type_map())
    }

    /// Restrict reading to `topics`. An empty list reads every topic again.
    fn set_filter(&mut self, topics: Vec<String>) -> PyResult<()> {
        to_py_result(self.inner.set_filter(topics))
    }

    /// All remaining records as a list, read once and cached.
    #[getter]
    fn records<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let records = to_py_result(self.inner.records())?;
        let list = PyList::empty(py);
        for record in records {
            list.append(fields_to_py(py, record)?)?;
        }
        Ok(list)
    }

    fn __iter__(slf: PyRefMut<'_, Self>) -> PyRefMut<'_, Self> {
        slf
    }

    fn __next__<'py>(&mut self, py: Python<'py>) -> PyResult<Option<Bound<'py, PyDict>>> {
        match to_py_result(self.inner.read_next())? {
            Some(record) => Ok(Some(fields_to_py(py, &record)?)),
            None => Ok(None),
        }
    }

    fn __enter__(slf: PyRefMut<'_, Self>) -> PyRefMut<'_, Self> {
        slf
    }

    #[pyo3(signature = (*_args))]
    fn __exit__(&mut self, _args: &Bound<'_, pyo3::types::PyTuple>) -> bool {
        self.inner.close();
        false
    }

    fn __repr__(&self) -> String {
        match self.inner.path() {
            Some(path) => format!("Reader(path='{}')", path.display()),
            None => "Reader(closed)".to_string(),
        }
    }
}
