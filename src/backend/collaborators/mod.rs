//! Collaborators Module
//!
//! Per-note grants and their HTTP handlers.
//!
//! - **`db`** - `Collaborator` / `SharedNote` rows and queries
//! - **`handlers`** - `/api/collaborators` handlers

/// Collaborator rows and queries
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::{Collaborator, SharedNote};
