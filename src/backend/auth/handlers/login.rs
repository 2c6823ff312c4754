/**
 * Login Handler
 *
 * This module implements the user authentication handler for POST /api/auth/login.
 *
 * # Authentication Process
 *
 * 1. Look up user by email
 * 2. Verify password using bcrypt
 * 3. Issue a token
 * 4. Return token and user info
 *
 * # Security
 *
 * Unknown email and wrong password produce the same 401 body.
 */
use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::backend::auth::users::get_user_by_email;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::SharedError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login handler
///
/// # Errors
///
/// * `400 Bad Request` - Email or password missing
/// * `401 Unauthorized` - User not found or password incorrect
/// * `500 Internal Server Error` - Database, bcrypt or signing failure
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(SharedError::validation("email", "Email and password are required").into());
    }
    tracing::info!("Login request for: {}", email);

    let user = get_user_by_email(&state.pool, &email).await?.ok_or_else(|| {
        tracing::warn!("User not found: {}", email);
        BackendError::unauthenticated(INVALID_CREDENTIALS)
    })?;

    let valid = verify(&request.password, &user.password_hash).map_err(|e| {
        tracing::error!("Password verification error: {:?}", e);
        BackendError::internal("Password verification failed")
    })?;

    if !valid {
        tracing::warn!("Invalid password for user: {}", email);
        return Err(BackendError::unauthenticated(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(user.id)?;

    tracing::info!("User logged in: {} ({})", user.id, user.email);

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}
