/**
 * Identity Resolution
 *
 * Turns a presented credential into a live `User`. Both transports go
 * through `IdentityResolver::resolve`: the HTTP bearer middleware and the
 * WebSocket `authenticate` event.
 *
 * # Steps
 *
 * 1. Strip an optional `Bearer ` prefix
 * 2. Verify the token with the `TokenService`
 * 3. Load the principal; a deleted account yields `AuthError::UnknownUser`
 */
use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::auth::sessions::{strip_bearer, AuthError, TokenService};
use crate::backend::auth::users::{get_user_by_id, User};

/// Failure to resolve a credential into a user
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Identity lookup failed")]
    Persistence(#[from] sqlx::Error),
}

/// Resolves credentials against the token service and the user table
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    pool: SqlitePool,
    tokens: Arc<TokenService>,
}

impl IdentityResolver {
    pub fn new(pool: SqlitePool, tokens: Arc<TokenService>) -> Self {
        Self { pool, tokens }
    }

    /// Resolve a raw token or `Bearer <token>` into its user
    ///
    /// # Errors
    ///
    /// `IdentityError::Auth` when the token is rejected or names an account
    /// that no longer exists, `IdentityError::Persistence` when the lookup
    /// itself fails.
    pub async fn resolve(&self, credential: &str) -> Result<User, IdentityError> {
        let principal = self.tokens.verify(strip_bearer(credential))?;

        get_user_by_id(&self.pool, principal).await?.ok_or_else(|| {
            tracing::warn!("Token for unknown user {}", principal);
            IdentityError::Auth(AuthError::UnknownUser)
        })
    }
}
