//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - `/api` endpoints
//! ```
//!
//! # Route Types
//!
//! - `GET /ws` - WebSocket real-time channel
//! - `/api/auth/*` - Registration, login, logout, current user
//! - `/api/notes*` - Note CRUD
//! - `/api/collaborators/*` - Grant management and shared notes
//! - `GET /api/health` - Liveness and live connection count
//!
//! # Example
//!
//! ```rust,no_run
//! use notesync::backend::routes::create_router;
//! use notesync::backend::server::AppState;
//!
//! fn app(state: AppState) -> axum::Router {
//!     create_router(state)
//! }
//! ```

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
