/**
 * Authentication Handler Types
 *
 * Request and response types shared by the register, login and me handlers.
 */

use serde::{Deserialize, Serialize};

use crate::backend::auth::users::User;
use crate::shared::UserId;

/// Registration request
#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    /// Plain password, hashed with bcrypt before storage
    pub password: String,
    /// Display name; defaults to the local part of the email
    #[serde(default)]
    pub name: Option<String>,
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Auth response
///
/// Returned by register and login. Contains the bearer token and user
/// information for immediate authentication.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Wrapper for `GET /api/auth/me`
#[derive(Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub user: UserResponse,
}

/// Plain acknowledgement body
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
