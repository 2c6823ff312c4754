//! Shared Module
//!
//! This module contains types that are shared between the HTTP API, the
//! real-time channel and any Rust client of the service. Nothing in here
//! touches the database or the network.
//!
//! # Overview
//!
//! - identifiers for principals and notes
//! - the ordered `PermissionLevel`
//! - the real-time wire frames
//! - application configuration
//! - shared error types

/// Principal (user) identifier
pub type UserId = i64;

/// Note identifier
pub type NoteId = i64;

/// Permission levels for notes
pub mod permission;

/// Real-time event frames
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use permission::PermissionLevel;
pub use event::{ClientEvent, NoteUpdatePayload, ServerEvent};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
