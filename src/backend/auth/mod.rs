//! Authentication Module
//!
//! This module handles user accounts, credential verification and session
//! tokens.
//!
//! # Architecture
//!
//! - **`users`** - User data model and database operations
//! - **`sessions`** - `TokenService`: token issuing and verification
//! - **`identity`** - `IdentityResolver`: credential to live user, for both transports
//! - **`handlers`** - HTTP handlers for authentication endpoints
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - Token service
//! ├── identity.rs     - Credential resolution
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: email, password, name → user created → token returned
//! 2. **Login**: email, password → bcrypt verify → token returned
//! 3. **Me**: bearer token → middleware verifies → user returned
//!
//! The same token authenticates a WebSocket connection through the
//! `authenticate` event. Both paths resolve it with `IdentityResolver`, so a
//! token whose account was deleted is refused on either transport.
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens are stateless HS256 JWTs, valid for `JWT_TTL_SECS`
//! - Invalid credentials return 401 without saying which part was wrong

/// User data model and database operations
pub mod users;

/// Token issuing and verification
pub mod sessions;

/// Credential resolution shared by HTTP and WebSocket
pub mod identity;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::{get_me, login, logout, register};
pub use identity::{IdentityError, IdentityResolver};
pub use sessions::{AuthError, TokenService};
pub use users::User;
