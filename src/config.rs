// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader configuration.
//!
//! [`ReaderOptions`] carries everything needed to open a recording. It can be
//! built in code or loaded from a TOML file:
//!
//! ```toml
//! path = "recordings/run_01"
//! storage_id = "mcap"
//! topics = ["/chatter"]
//! message_paths = ["/opt/ros/humble/share"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{BagError, Encoding, Result};
use crate::io::metadata::{ConverterOptions, StorageKind, StorageOptions};

/// Options for opening a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Recording file or bag directory
    pub path: PathBuf,
    /// Storage backend identifier
    #[serde(default = "default_storage_id")]
    pub storage_id: String,
    /// Serialization format of the payloads
    #[serde(default = "default_serialization_format")]
    pub serialization_format: String,
    /// Topics to read; empty means all
    #[serde(default)]
    pub topics: Vec<String>,
    /// Directories searched for `.msg` files of unregistered types
    #[serde(default)]
    pub message_paths: Vec<PathBuf>,
}

fn default_storage_id() -> String {
    StorageKind::default().as_str().to_string()
}

fn default_serialization_format() -> String {
    Encoding::default().as_str().to_string()
}

impl ReaderOptions {
    /// Options for `path` with default storage and serialization.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storage_id: default_storage_id(),
            serialization_format: default_serialization_format(),
            topics: Vec::new(),
            message_paths: Vec::new(),
        }
    }

    /// Set the storage backend identifier.
    pub fn with_storage_id(mut self, storage_id: impl Into<String>) -> Self {
        self.storage_id = storage_id.into();
        self
    }

    /// Set the serialization format.
    pub fn with_serialization_format(mut self, format: impl Into<String>) -> Self {
        self.serialization_format = format.into();
        self
    }

    /// Restrict reading to the given topics.
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Add a `.msg` search directory.
    pub fn with_message_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.message_paths.push(dir.into());
        self
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BagError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if the text cannot be parsed or validated
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: Self = toml::from_str(content)
            .map_err(|e| BagError::Config(format!("Failed to parse config: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns error for an empty path, an unknown storage identifier, or an
    /// unsupported serialization format
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(BagError::Config("path cannot be empty".to_string()));
        }
        self.storage_id.parse::<StorageKind>()?;
        self.converter_options().encoding()?;
        if let Some(topic) = self.topics.iter().find(|t| t.is_empty()) {
            return Err(BagError::Config(format!(
                "topic names cannot be empty (got {topic:?})"
            )));
        }
        Ok(())
    }

    /// Storage options for the cursor.
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions::new(self.path.clone(), self.storage_id.clone())
    }

    /// Converter options for the cursor.
    pub fn converter_options(&self) -> ConverterOptions {
        ConverterOptions::new(self.serialization_format.clone())
    }
}
