/**
 * Error Conversion
 *
 * This module converts backend errors into HTTP responses and lifts the
 * errors of lower layers (`AccessError`, `AuthError`, `IdentityError`) into
 * `BackendError` so handlers can use `?`.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */
use axum::response::{IntoResponse, Json, Response};

use crate::backend::access::AccessError;
use crate::backend::auth::identity::IdentityError;
use crate::backend::auth::sessions::AuthError;
use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Persistence(e) => tracing::error!("Database error: {:?}", e),
            Self::Internal(e) => tracing::error!("Internal error: {}", e),
            other => tracing::debug!("Request rejected with {}: {}", status, other),
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<AccessError> for BackendError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound => Self::not_found("Note not found"),
            AccessError::Forbidden { .. } => Self::forbidden("Access denied"),
            AccessError::Persistence(e) => Self::Persistence(e),
        }
    }
}

impl From<AuthError> for BackendError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(message) => Self::internal(message),
            other => Self::unauthenticated(other.to_string()),
        }
    }
}

impl From<IdentityError> for BackendError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Auth(e) => e.into(),
            IdentityError::Persistence(e) => Self::Persistence(e),
        }
    }
}
