/**
 * Session Tokens
 *
 * This module issues and verifies the signed bearer tokens that identify a
 * principal on both transports. Tokens are stateless HS256 JWTs carrying
 * `{sub, iat, exp}` in Unix seconds.
 *
 * # Verification Order
 *
 * 1. The token must decode into the expected claims (`MalformedToken`).
 * 2. `now >= exp` yields `Expired`, whatever the signature.
 * 3. `iat > now` yields `NotYetValid`.
 * 4. The signature must match the current key (`InvalidSignature`).
 *
 * Rotating `JWT_SECRET` invalidates every outstanding token.
 */
use std::fmt;

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::config::{AppConfig, ConfigError};
use crate::shared::UserId;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id, as a decimal string
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Identity resolution failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token cannot be parsed into the expected claims
    #[error("Malformed token")]
    MalformedToken,
    /// Current time is at or after the expiry
    #[error("Token expired")]
    Expired,
    /// Token claims to be issued in the future
    #[error("Token not yet valid")]
    NotYetValid,
    /// Signature does not match the current key
    #[error("Invalid token signature")]
    InvalidSignature,
    /// The token is valid but its account has been deleted
    #[error("User no longer exists")]
    UnknownUser,
    /// The connection presenting the token is not registered
    #[error("Unknown connection")]
    UnknownConnection,
    /// Signing a new token failed
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies bearer tokens with a single HMAC key
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from a secret and a lifetime
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingValue("JWT_SECRET")` for a blank secret.
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_TTL_SECS",
                value: ttl_secs.to_string(),
            });
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        })
    }

    /// Create a token service from the loaded configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::new(&config.jwt_secret, config.token_ttl_secs)
    }

    /// Lifetime of issued tokens in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `principal` valid from now
    pub fn issue(&self, principal: UserId) -> Result<String, AuthError> {
        self.issue_at(principal, now_unix())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, principal: UserId, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token and return the principal it names
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify_at(token, now_unix())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: i64) -> Result<UserId, AuthError> {
        let unverified = decode::<Claims>(token, &self.decoding_key, &unchecked_validation())
            .map_err(|_| AuthError::MalformedToken)?
            .claims;

        if now >= unverified.exp {
            return Err(AuthError::Expired);
        }
        if unverified.iat > now {
            return Err(AuthError::NotYetValid);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &signature_validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?
            .claims;

        claims.sub.parse().map_err(|_| AuthError::MalformedToken)
    }
}

/// Strip an optional `Bearer ` prefix from a presented credential
pub fn strip_bearer(credential: &str) -> &str {
    let trimmed = credential.trim();
    trimmed.strip_prefix("Bearer ").map(str::trim).unwrap_or(trimmed)
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

// Time checks are done against an injected clock, so the library's own
// expiry check is switched off in both passes.
fn signature_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation
}

fn unchecked_validation() -> Validation {
    let mut validation = signature_validation();
    validation.insecure_disable_signature_validation();
    validation
}
