/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Real-time channel (`/ws`)
 * 2. API routes (`/api/...`)
 * 3. Fallback handler (JSON 404)
 *
 * Every request is traced by `tower-http`'s `TraceLayer`.
 */

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::realtime::socket::handle_socket_upgrade;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state (pool, token service, registry, config)
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/ws", get(handle_socket_upgrade));

    let router = configure_api_routes(router, &app_state);

    let router = router.fallback(|| async { BackendError::not_found("Route not found") });

    router
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
