/**
 * Backend Error Types
 *
 * This module defines the error type returned by every HTTP handler.
 * Each variant maps to exactly one HTTP status code.
 *
 * # Status Mapping
 *
 * - `Unauthenticated` - 401, missing or invalid bearer token
 * - `Forbidden` - 403, principal lacks the required permission level
 * - `NotFound` - 404, note, user or collaborator row absent
 * - `Validation` / `SharedError` - 400, malformed client input
 * - `Conflict` - 409, duplicate email or collaborator
 * - `Persistence` - 500, store failure (message redacted)
 * - `Internal` - 500, hashing or signing failure
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use notesync::backend::error::BackendError;
///
/// let err = BackendError::not_found("Note not found");
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// No valid identity accompanied the request
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Identity is known but its permission level is too low
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Target resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body or parameters failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request conflicts with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Store failure
    ///
    /// The underlying error is logged, never returned to the client.
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Any other server-side failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackendError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message shown to the client
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Validation(message)
            | Self::Conflict(message) => message.clone(),
            Self::SharedError(err) => match err {
                SharedError::ValidationError { message, .. } => message.clone(),
                SharedError::SerializationError { message } => message.clone(),
            },
            Self::Persistence(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}
