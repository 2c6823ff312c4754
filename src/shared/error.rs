//! Shared Error Types
//!
//! This module defines error types that are shared between the HTTP API and
//! the real-time channel. These errors represent malformed input that either
//! transport can receive from a client.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures (bad permission string,
//!   non-numeric note id, unknown event name)
//!
//! # Usage
//!
//! ```rust
//! use notesync::shared::error::SharedError;
//!
//! let error = SharedError::validation("permission", "must be 'read', 'write', or 'admin'");
//! ```
use thiserror::Error;

/// Shared error types raised while decoding client input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
