//! Application configuration module
//!
//! Provides the configuration shared by the server binary, the router and the
//! integration tests. Values are assembled through [`AppConfigBuilder`]; the
//! backend fills the builder from the environment.

use thiserror::Error;

/// Default SQLite location, created on first start
pub const DEFAULT_DATABASE_URL: &str = "sqlite://notesync.db?mode=rwc";

/// Default token lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Default listen port
pub const DEFAULT_SERVER_PORT: u16 = 4000;

/// Default pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default bcrypt work factor
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Maximum number of pooled database connections
    pub database_max_connections: u32,
    /// HMAC key used to sign and verify access tokens
    pub jwt_secret: String,
    /// Lifetime of an issued token in seconds
    pub token_ttl_secs: i64,
    /// Port the HTTP server listens on
    pub server_port: u16,
    /// Send `update-rejected` frames back to the originator of a refused edit
    pub notify_rejected_updates: bool,
    /// bcrypt work factor for new password hashes (4..=31)
    pub bcrypt_cost: u32,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_TTL_SECS",
                value: self.token_ttl_secs.to_string(),
            });
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST",
                value: self.bcrypt_cost.to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    database_url: Option<String>,
    database_max_connections: Option<u32>,
    jwt_secret: Option<String>,
    token_ttl_secs: Option<i64>,
    server_port: Option<u16>,
    notify_rejected_updates: Option<bool>,
    bcrypt_cost: Option<u32>,
}

impl AppConfigBuilder {
    /// Set the database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set the pool size
    pub fn database_max_connections(mut self, max: u32) -> Self {
        self.database_max_connections = Some(max);
        self
    }

    /// Set the token signing secret
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    /// Set the token lifetime in seconds
    pub fn token_ttl_secs(mut self, secs: i64) -> Self {
        self.token_ttl_secs = Some(secs);
        self
    }

    /// Set the listen port
    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    /// Enable or disable rejection notices on the real-time channel
    pub fn notify_rejected_updates(mut self, enabled: bool) -> Self {
        self.notify_rejected_updates = Some(enabled);
        self
    }

    /// Set the bcrypt work factor
    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = Some(cost);
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingValue("JWT_SECRET")` when no secret was
    /// given or it is blank, and `ConfigError::InvalidValue` for non-positive
    /// lifetimes or an empty pool.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            database_url: self
                .database_url
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: self
                .database_max_connections
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            jwt_secret: self.jwt_secret.ok_or(ConfigError::MissingValue("JWT_SECRET"))?,
            token_ttl_secs: self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS),
            server_port: self.server_port.unwrap_or(DEFAULT_SERVER_PORT),
            notify_rejected_updates: self.notify_rejected_updates.unwrap_or(false),
            bcrypt_cost: self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
