//! Backend Module
//!
//! This module contains all server-side code for NoteSync. It provides an
//! Axum HTTP server with a JSON API, a WebSocket real-time channel and SQLite
//! persistence.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`auth`** - Token service, user storage, authentication handlers
//! - **`access`** - The single authorization decision used by every transport
//! - **`notes`** - Note storage and HTTP handlers
//! - **`collaborators`** - Collaborator storage and HTTP handlers
//! - **`realtime`** - Connection registry, rooms, update pipeline, WebSocket
//! - **`middleware`** - Bearer token extractor
//! - **`error`** - Backend error type and HTTP conversion
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Tokens, users, auth handlers
//! ├── access/         - Authorization engine
//! ├── notes/          - Notes store and handlers
//! ├── collaborators/  - Collaborators store and handlers
//! ├── realtime/       - Registry, rooms, pipeline, socket
//! ├── middleware/     - Request extractors
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds the database pool, the token service, the connection
//! registry and the loaded configuration. The registry keeps its bidirectional
//! room index under a single `parking_lot::RwLock` that is never held across
//! an `.await`.
//!
//! # Error Handling
//!
//! Handlers return `Result<_, BackendError>`; `AccessError`, `AuthError` and
//! `sqlx::Error` convert into it with `?`. Real-time rejections never close a
//! connection.

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Authentication and user management
#[cfg(feature = "ssr")]
pub mod auth;

/// Authorization engine
#[cfg(feature = "ssr")]
pub mod access;

/// Notes storage and handlers
#[cfg(feature = "ssr")]
pub mod notes;

/// Collaborator storage and handlers
#[cfg(feature = "ssr")]
pub mod collaborators;

/// Real-time update system
#[cfg(feature = "ssr")]
pub mod realtime;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use server::create_app;
#[cfg(feature = "ssr")]
pub use error::BackendError;
#[cfg(feature = "ssr")]
pub use realtime::ConnectionRegistry;
