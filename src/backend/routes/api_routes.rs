/**
 * API Route Handlers
 *
 * This module defines the `/api` endpoints.
 *
 * # Routes
 *
 * ## Authentication (public)
 * - `POST /api/auth/register` - User registration
 * - `POST /api/auth/login` - User login
 * - `POST /api/auth/logout` - Acknowledge logout
 *
 * ## Protected (bearer token)
 * - `GET /api/auth/me`
 * - `GET|POST /api/notes`
 * - `GET|PUT|DELETE /api/notes/{id}`
 * - `GET|POST /api/collaborators/note/{note_id}`
 * - `PUT|DELETE /api/collaborators/note/{note_id}/user/{user_id}`
 * - `GET /api/collaborators/shared-with-me`
 *
 * ## Health
 * - `GET /api/health`
 */

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::backend::auth::{get_me, login, logout, register};
use crate::backend::collaborators::handlers::{
    add_collaborator, list_collaborators, remove_collaborator, shared_with_me, update_collaborator,
};
use crate::backend::middleware::auth_middleware;
use crate::backend::notes::handlers::{create_note, delete_note, get_note, list_notes, update_note};
use crate::backend::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Live WebSocket connections
    pub connections: usize,
}

/// Health probe
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.registry.connection_count(),
    })
}

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
/// * `state` - Application state, needed by `auth_middleware`
///
/// # Returns
///
/// Router with API routes configured
pub fn configure_api_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/notes", get(list_notes).post(create_note))
        .route(
            "/api/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route(
            "/api/collaborators/note/{note_id}",
            get(list_collaborators).post(add_collaborator),
        )
        .route(
            "/api/collaborators/note/{note_id}/user/{user_id}",
            axum::routing::put(update_collaborator).delete(remove_collaborator),
        )
        .route("/api/collaborators/shared-with-me", get(shared_with_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    router
        // Public endpoints
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/health", get(health))
        .merge(protected)
}
