//! Notes Module
//!
//! Storage and HTTP handlers for notes.
//!
//! - **`db`** - `Note` row and queries
//! - **`handlers`** - `/api/notes` CRUD handlers

/// Note row and queries
pub mod db;

/// HTTP handlers
pub mod handlers;

pub use db::{Note, NoteChanges, NoteFilter, NewNote};
