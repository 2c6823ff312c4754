//! Authentication Handlers Module
//!
//! This module contains all HTTP handlers for authentication endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs       - Module exports and documentation
//! ├── types.rs     - Request and response types
//! ├── register.rs  - User registration handler
//! ├── login.rs     - User authentication handler
//! └── me.rs        - Current user and logout handlers
//! ```
//!
//! # Handlers
//!
//! - **`register`** - POST /api/auth/register
//! - **`login`** - POST /api/auth/login
//! - **`logout`** - POST /api/auth/logout
//! - **`get_me`** - GET /api/auth/me (behind `auth_middleware`)

/// Request and response types
pub mod types;

/// Register handler
pub mod register;

/// Login handler
pub mod login;

/// Get current user / logout handlers
pub mod me;

pub use types::{AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest, UserResponse};

pub use login::login;
pub use me::{get_me, logout};
pub use register::register;
