/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - SQLite connection pool
 * - Token service for issuing and verifying session tokens
 * - Identity resolver shared by the bearer middleware and the socket
 * - Connection registry for real-time delivery
 * - Validated configuration
 *
 * # Thread Safety
 *
 * Every field is cheap to clone: `SqlitePool` is reference counted
 * internally, the rest are `Arc`s. The registry does its own locking.
 *
 * # Example
 *
 * ```rust,no_run
 * use notesync::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) {
 *     let live = state.registry.connection_count();
 *     // ...
 * }
 * ```
 */

use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::backend::auth::identity::IdentityResolver;
use crate::backend::auth::sessions::TokenService;
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::shared::AppConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub pool: SqlitePool,

    /// Session token issuing and verification
    pub tokens: Arc<TokenService>,

    /// Credential to user resolution for both transports
    pub identity: IdentityResolver,

    /// Live WebSocket connections and their rooms
    ///
    /// Holds a clone of `identity` so socket authentication and HTTP
    /// authentication accept exactly the same credentials.
    pub registry: Arc<ConnectionRegistry>,

    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Assemble state from a ready pool and a validated configuration
    pub fn new(pool: SqlitePool, tokens: TokenService, config: AppConfig) -> Self {
        let tokens = Arc::new(tokens);
        let identity = IdentityResolver::new(pool.clone(), Arc::clone(&tokens));
        let registry = Arc::new(ConnectionRegistry::new(identity.clone()));
        Self {
            pool,
            tokens,
            identity,
            registry,
            config: Arc::new(config),
        }
    }
}

/// Implement FromRef for SqlitePool
///
/// Allows handlers to take `State(pool): State<SqlitePool>`.
impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
