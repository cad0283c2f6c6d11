// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Error types for bagrecord.
//!
//! Every failure names the stage it happened in:
//! - opening a recording
//! - reading from the storage cursor
//! - resolving a topic or message type
//! - deserializing a payload into fields

use thiserror::Error;

/// Errors raised while opening, reading, or converting a recording.
#[derive(Debug, Clone, Error)]
pub enum BagError {
    /// The recording could not be opened with the requested configuration.
    #[error("Failed to open '{path}': {reason}")]
    Open {
        /// Path passed to open
        path: String,
        /// Why the backend rejected it
        reason: String,
    },

    /// An operation needed an open recording but none was open.
    #[error("No recording is open")]
    NotOpen,

    /// The cursor produced an entry for a topic missing from its own metadata.
    #[error("Topic '{topic}' is not present in the recording metadata")]
    TopicResolution {
        /// Topic name of the offending entry
        topic: String,
    },

    /// A message specification did not split into package/category/name.
    #[error("Invalid message specification '{specification}': expected 3 '/'-separated components, found {components}")]
    SpecificationFormat {
        /// The specification string as given
        specification: String,
        /// Number of components found
        components: usize,
    },

    /// A message type could not be located by the type registry.
    #[error("Message type not found: '{type_name}'")]
    TypeResolution {
        /// Fully-qualified type name
        type_name: String,
    },

    /// A payload could not be decoded with its declared type.
    #[error("Failed to deserialize '{type_name}' on topic '{topic}': {cause}")]
    Deserialization {
        /// Topic of the entry
        topic: String,
        /// Declared message type
        type_name: String,
        /// Underlying decode failure
        cause: String,
    },

    /// A message field has the same name as a reserved record key.
    #[error("Field '{field}' of '{type_name}' on topic '{topic}' collides with a reserved record key")]
    ReservedKeyCollision {
        /// Topic of the entry
        topic: String,
        /// Declared message type
        type_name: String,
        /// Colliding field name
        field: String,
    },

    /// The storage backend failed while reading.
    #[error("Storage error in {context}: {message}")]
    Storage {
        /// Backend or operation
        context: String,
        /// Error message
        message: String,
    },

    /// Parse error in a schema definition.
    #[error("Parse error in {context}: {message}")]
    Parse {
        /// What was being parsed
        context: String,
        /// Error message
        message: String,
    },

    /// Buffer too short for requested read.
    #[error("Buffer too short: requested {requested} bytes at position {cursor_pos}, but only {available} bytes available")]
    BufferTooShort {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when error occurred
        cursor_pos: u64,
    },

    /// Array, sequence, or string length exceeded data bounds.
    #[error("Length {length} exceeds buffer at position {position} (buffer length: {buffer_len})")]
    LengthExceeded {
        /// Length that was read
        length: usize,
        /// Position in buffer
        position: usize,
        /// Buffer length
        buffer_len: usize,
    },

    /// A value did not match the type its schema declared (encoding side).
    #[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared type
        expected: String,
        /// Value type supplied
        actual: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O failure outside of a backend read.
    #[error("I/O error: {0}")]
    Io(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl BagError {
    /// Create an open error.
    pub fn open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        BagError::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a topic resolution error.
    pub fn topic_resolution(topic: impl Into<String>) -> Self {
        BagError::TopicResolution {
            topic: topic.into(),
        }
    }

    /// Create a specification format error.
    pub fn specification_format(specification: impl Into<String>, components: usize) -> Self {
        BagError::SpecificationFormat {
            specification: specification.into(),
            components,
        }
    }

    /// Create a type resolution error.
    pub fn type_resolution(type_name: impl Into<String>) -> Self {
        BagError::TypeResolution {
            type_name: type_name.into(),
        }
    }

    /// Wrap a decode failure with the entry it happened on.
    pub fn deserialization(
        topic: impl Into<String>,
        type_name: impl Into<String>,
        cause: impl std::fmt::Display,
    ) -> Self {
        BagError::Deserialization {
            topic: topic.into(),
            type_name: type_name.into(),
            cause: cause.to_string(),
        }
    }

    /// Create a reserved key collision error.
    pub fn reserved_key_collision(
        topic: impl Into<String>,
        type_name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        BagError::ReservedKeyCollision {
            topic: topic.into(),
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(context: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Storage {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a buffer too short error.
    pub fn buffer_too_short(requested: usize, available: usize, cursor_pos: u64) -> Self {
        BagError::BufferTooShort {
            requested,
            available,
            cursor_pos,
        }
    }

    /// Create a length exceeded error.
    pub fn length_exceeded(length: usize, position: usize, buffer_len: usize) -> Self {
        BagError::LengthExceeded {
            length,
            position,
            buffer_len,
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        BagError::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Short name of the stage that failed, for diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            BagError::Open { .. } | BagError::Config(_) => "open",
            BagError::NotOpen | BagError::Other(_) => "state",
            BagError::Storage { .. } | BagError::Io(_) => "cursor read",
            BagError::TopicResolution { .. }
            | BagError::SpecificationFormat { .. }
            | BagError::TypeResolution { .. }
            | BagError::Parse { .. } => "type resolution",
            BagError::Deserialization { .. }
            | BagError::BufferTooShort { .. }
            | BagError::LengthExceeded { .. }
            | BagError::TypeMismatch { .. } => "deserialization",
            BagError::ReservedKeyCollision { .. } => "record assembly",
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            BagError::Open { path, reason } => {
                vec![("path", path.clone()), ("reason", reason.clone())]
            }
            BagError::NotOpen => Vec::new(),
            BagError::TopicResolution { topic } => vec![("topic", topic.clone())],
            BagError::SpecificationFormat {
                specification,
                components,
            } => vec![
                ("specification", specification.clone()),
                ("components", components.to_string()),
            ],
            BagError::TypeResolution { type_name } => vec![("type", type_name.clone())],
            BagError::Deserialization {
                topic,
                type_name,
                cause,
            } => vec![
                ("topic", topic.clone()),
                ("type", type_name.clone()),
                ("cause", cause.clone()),
            ],
            BagError::ReservedKeyCollision {
                topic,
                type_name,
                field,
            } => vec![
                ("topic", topic.clone()),
                ("type", type_name.clone()),
                ("field", field.clone()),
            ],
            BagError::Storage { context, message } | BagError::Parse { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            BagError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("cursor", cursor_pos.to_string()),
            ],
            BagError::LengthExceeded {
                length,
                position,
                buffer_len,
            } => vec![
                ("length", length.to_string()),
                ("position", position.to_string()),
                ("buffer_len", buffer_len.to_string()),
            ],
            BagError::TypeMismatch {
                field,
                expected,
                actual,
            } => vec![
                ("field", field.clone()),
                ("expected", expected.clone()),
                ("actual", actual.clone()),
            ],
            BagError::Config(msg) | BagError::Io(msg) | BagError::Other(msg) => {
                vec![("message", msg.clone())]
            }
        }
    }
}

impl From<std::io::Error> for BagError {
    fn from(err: std::io::Error) -> Self {
        BagError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for BagError {
    fn from(err: rusqlite::Error) -> Self {
        BagError::storage("sqlite3", err.to_string())
    }
}

/// Result type for bagrecord operations.
pub type Result<T> = std::result::Result<T, BagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error() {
        let err = BagError::open("/missing.db3", "file does not exist");
        assert!(matches!(err, BagError::Open { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to open '/missing.db3': file does not exist"
        );
        assert_eq!(err.stage(), "open");
    }

    #[test]
    fn test_not_open_error() {
        assert_eq!(BagError::NotOpen.to_string(), "No recording is open");
        assert!(BagError::NotOpen.log_fields().is_empty());
    }

    #[test]
    fn test_specification_format_error() {
        let err = BagError::specification_format("bad/spec", 2);
        assert_eq!(
            err.to_string(),
            "Invalid message specification 'bad/spec': expected 3 '/'-separated components, found 2"
        );
        assert_eq!(err.stage(), "type resolution");
    }

    #[test]
    fn test_type_resolution_error() {
        let err = BagError::type_resolution("pkg/msg/Missing");
        assert_eq!(err.to_string(), "Message type not found: 'pkg/msg/Missing'");
    }

    #[test]
    fn test_deserialization_error_keeps_context() {
        let inner = BagError::buffer_too_short(4, 1, 8);
        let err = BagError::deserialization("/chatter", "std_msgs/msg/String", &inner);
        let fields = err.log_fields();
        assert_eq!(fields[0], ("topic", "/chatter".to_string()));
        assert_eq!(fields[1], ("type", "std_msgs/msg/String".to_string()));
        assert!(fields[2].1.contains("Buffer too short"));
        assert_eq!(err.stage(), "deserialization");
    }

    #[test]
    fn test_reserved_key_collision_error() {
        let err = BagError::reserved_key_collision("/t", "pkg/msg/Bad", "topic");
        assert_eq!(
            err.to_string(),
            "Field 'topic' of 'pkg/msg/Bad' on topic '/t' collides with a reserved record key"
        );
        assert_eq!(err.stage(), "record assembly");
    }

    #[test]
    fn test_log_fields_buffer_too_short() {
        let err = BagError::buffer_too_short(100, 50, 10);
        let fields = err.log_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], ("requested", "100".to_string()));
        assert_eq!(fields[1], ("available", "50".to_string()));
        assert_eq!(fields[2], ("cursor", "10".to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BagError = io_err.into();
        assert!(matches!(err, BagError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: file not found");
    }

    #[test]
    fn test_error_clone() {
        let err1 = BagError::parse("msg schema", "unexpected token");
        let err2 = err1.clone();
        assert_eq!(err1.to_string(), err2.to_string());
    }
}
