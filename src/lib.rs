//! NoteSync - Main Library
//!
//! NoteSync is a notes service with per-note access control and live
//! collaborative editing. Clients reach it through a JSON HTTP API or through
//! a persistent WebSocket channel; both transports go through the same
//! authorization decision.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and clients
//!   - Identifiers and permission levels
//!   - Real-time wire frames
//!   - Configuration and error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and WebSocket channel
//!   - Token service, authorization engine
//!   - Connection registry, room broadcaster, update pipeline
//!   - SQLite persistence through sqlx
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enables the `backend` module). On by default.
//!
//! # Usage
//!
//! ```rust,no_run
//! use notesync::backend::server::{config::load_config, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! let app = create_app(config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency Model
//!
//! Edits are last-writer-wins. Live delivery is best-effort to the connections
//! that are members of a note's room at the moment of the broadcast.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
