/**
 * Server Configuration
 *
 * This module loads the server configuration from environment variables and
 * opens the SQLite connection pool.
 *
 * # Configuration Sources
 *
 * `.env` is loaded by `main` through `dotenv`; every value below can then be
 * overridden by the process environment.
 *
 * | Variable | Default |
 * |---|---|
 * | `DATABASE_URL` | `sqlite://notesync.db?mode=rwc` |
 * | `DATABASE_MAX_CONNECTIONS` | `5` |
 * | `JWT_SECRET` | required |
 * | `JWT_TTL_SECS` | `86400` |
 * | `SERVER_PORT` | `4000` |
 * | `NOTIFY_REJECTED_UPDATES` | `false` |
 * | `BCRYPT_COST` | `12` |
 *
 * # Error Handling
 *
 * Unlike optional services, the signing key and the database are required:
 * a missing `JWT_SECRET`, an unparsable value, a failed connection or a
 * failed migration all abort startup.
 */
use std::str::FromStr;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::shared::config::{AppConfig, ConfigError};

/// Load the configuration from the process environment
///
/// # Errors
///
/// Returns `ConfigError::MissingValue("JWT_SECRET")` if the secret is absent or
/// blank and `ConfigError::InvalidValue` for values that fail to parse.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build the configuration from an arbitrary key lookup
///
/// `load_config` passes the process environment; tests pass a map.
pub fn config_from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = AppConfig::builder();

    if let Some(url) = lookup("DATABASE_URL") {
        builder = builder.database_url(url);
    }
    if let Some(max) = parse_var::<u32, _>(&lookup, "DATABASE_MAX_CONNECTIONS")? {
        builder = builder.database_max_connections(max);
    }
    if let Some(secret) = lookup("JWT_SECRET") {
        builder = builder.jwt_secret(secret);
    }
    if let Some(ttl) = parse_var::<i64, _>(&lookup, "JWT_TTL_SECS")? {
        builder = builder.token_ttl_secs(ttl);
    }
    if let Some(port) = parse_var::<u16, _>(&lookup, "SERVER_PORT")? {
        builder = builder.server_port(port);
    }
    if let Some(flag) = lookup("NOTIFY_REJECTED_UPDATES") {
        builder = builder.notify_rejected_updates(parse_flag("NOTIFY_REJECTED_UPDATES", &flag)?);
    }
    if let Some(cost) = parse_var::<u32, _>(&lookup, "BCRYPT_COST")? {
        builder = builder.bcrypt_cost(cost);
    }

    builder.build()
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Open the SQLite pool and run the embedded migrations
///
/// # Errors
///
/// Returns the connection error, or the migration error converted into
/// `sqlx::Error`.
pub async fn load_database(config: &AppConfig) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            e
        })?;

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        sqlx::Error::from(e)
    })?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}
