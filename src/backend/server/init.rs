/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, database loading, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Validate configuration
 * 2. Build the token service
 * 3. Open the database and run migrations
 * 4. Create the connection registry and application state
 * 5. Create and configure the router
 *
 * Unlike optional services, the database and the signing secret are
 * required: any failure aborts startup with an `InitError`.
 */

use axum::Router;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::auth::sessions::TokenService;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;
use crate::shared::{AppConfig, ConfigError};

/// Startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create and configure the Axum application
///
/// # Arguments
///
/// * `config` - Application configuration, usually from `load_config`
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
///
/// # Errors
///
/// `InitError::Config` if the configuration is invalid,
/// `InitError::Database` if the database cannot be opened or migrated.
pub async fn create_app(config: AppConfig) -> Result<Router<()>, InitError> {
    tracing::info!("Initializing NoteSync backend server");

    // Step 1: Validate configuration before touching the database
    config.validate()?;

    // Step 2: Load the database pool and apply migrations
    let pool = load_database(&config).await?;
    tracing::info!("Database ready");

    // Step 3: Create app state and router
    let state = build_state(pool, config)?;
    let app = create_router(state);

    tracing::info!("Router configured");
    Ok(app)
}

/// Build `AppState` around an existing pool
///
/// Used by `create_app` and by tests that prepare their own in-memory pool.
pub fn build_state(pool: SqlitePool, config: AppConfig) -> Result<AppState, ConfigError> {
    let tokens = TokenService::from_config(&config)?;
    tracing::debug!("Token service ready (ttl {}s)", tokens.ttl_secs());
    Ok(AppState::new(pool, tokens, config))
}
