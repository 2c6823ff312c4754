/**
 * Current User and Logout Handlers
 *
 * `GET /api/auth/me` returns the authenticated user; it sits behind
 * `auth_middleware`, which has already verified the token and loaded the
 * account.
 *
 * `POST /api/auth/logout` only acknowledges. Tokens are stateless, so the
 * client ends its session by discarding the token.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{MeResponse, MessageResponse, UserResponse};
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - Missing or invalid token (from the middleware)
/// * `404 Not Found` - Account removed after the middleware ran
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, BackendError> {
    let user = get_user_by_id(&state.pool, auth.id())
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    Ok(Json(MeResponse {
        user: UserResponse::from(user),
    }))
}

/// Logout handler
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}
