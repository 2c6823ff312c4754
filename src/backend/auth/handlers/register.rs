/**
 * Register Handler
 *
 * This module implements the user registration handler for POST /api/auth/register.
 *
 * # Registration Process
 *
 * 1. Validate email and password
 * 2. Check the email is not taken
 * 3. Hash the password with bcrypt
 * 4. Create the user and issue a token
 */
use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::hash;

use crate::backend::auth::handlers::types::{AuthResponse, RegisterRequest, UserResponse};
use crate::backend::auth::users::{create_user, get_user_by_email};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::SharedError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Register handler
///
/// # Returns
///
/// `201 {user, token}` on success
///
/// # Errors
///
/// * `400 Bad Request` - Missing or invalid email, password too short
/// * `409 Conflict` - Email already registered
/// * `500 Internal Server Error` - Hashing or database failure
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), BackendError> {
    let email = request.email.trim().to_lowercase();
    tracing::info!("Register request for: {}", email);

    validate_registration(&email, &request.password)?;

    if get_user_by_email(&state.pool, &email).await?.is_some() {
        tracing::warn!("Email already registered: {}", email);
        return Err(BackendError::conflict("User already exists"));
    }

    let password_hash = hash(&request.password, state.config.bcrypt_cost).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::internal("Failed to hash password")
    })?;

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_name(&email));

    let user = create_user(&state.pool, &email, &password_hash, &name)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BackendError::conflict("User already exists")
            }
            other => BackendError::from(other),
        })?;

    let token = state.tokens.issue(user.id)?;

    tracing::info!("User registered: {} ({})", user.id, user.email);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(user),
            token,
        }),
    ))
}

fn validate_registration(email: &str, password: &str) -> Result<(), SharedError> {
    if email.is_empty() || password.is_empty() {
        return Err(SharedError::validation("email", "Email and password are required"));
    }
    if !email.contains('@') {
        return Err(SharedError::validation("email", "Invalid email address"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(SharedError::validation(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
