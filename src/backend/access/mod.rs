//! Authorization Engine
//!
//! The single place where a principal's permission level on a note is
//! decided. HTTP handlers and the real-time update pipeline both call
//! [`authorize`]; neither re-derives the rules.
//!
//! # Decision
//!
//! 1. Note absent → `None`.
//! 2. Principal owns the note → `Admin`.
//! 3. Collaborator row present → its level; absent → `None`.
//!
//! # Operations
//!
//! | Operation | Minimum |
//! |---|---|
//! | `ViewNote`, `ListCollaborators` | `Read` |
//! | `EditNote`, `BroadcastUpdate` | `Write` |
//! | `ManageCollaborators`, `DeleteNote` | `Admin` |

use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::collaborators::db::permission_for;
use crate::backend::notes::db::{get_note, Note};
use crate::shared::{NoteId, PermissionLevel, SharedError, UserId};

/// Operation classes gated by a minimum permission level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ViewNote,
    ListCollaborators,
    EditNote,
    BroadcastUpdate,
    ManageCollaborators,
    DeleteNote,
}

impl Operation {
    /// Lowest level that permits this operation
    pub fn required_level(self) -> PermissionLevel {
        match self {
            Self::ViewNote | Self::ListCollaborators => PermissionLevel::Read,
            Self::EditNote | Self::BroadcastUpdate => PermissionLevel::Write,
            Self::ManageCollaborators | Self::DeleteNote => PermissionLevel::Admin,
        }
    }

    /// Whether `level` is enough for this operation
    pub fn permits(self, level: PermissionLevel) -> bool {
        level >= self.required_level()
    }
}

/// Authorization failures
#[derive(Debug, Error)]
pub enum AccessError {
    /// The note does not exist
    #[error("note not found")]
    NotFound,
    /// The principal's level is below the operation's minimum
    #[error("requires {required} permission, principal holds {held}")]
    Forbidden {
        held: PermissionLevel,
        required: PermissionLevel,
    },
    /// The store failed while deciding
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}

/// Level held by `principal` given the owner and an optional grant
pub fn level_for(
    owner: UserId,
    principal: UserId,
    grant: Option<PermissionLevel>,
) -> PermissionLevel {
    if owner == principal {
        return PermissionLevel::Admin;
    }
    grant.unwrap_or(PermissionLevel::None)
}

async fn level_on(
    pool: &SqlitePool,
    principal: UserId,
    note: &Note,
) -> Result<PermissionLevel, sqlx::Error> {
    if note.user_id == principal {
        return Ok(PermissionLevel::Admin);
    }
    let grant = permission_for(pool, note.id, principal).await?;
    Ok(level_for(note.user_id, principal, grant))
}

/// Decide the permission level `principal` holds on `note_id`
///
/// A missing note yields `PermissionLevel::None`.
///
/// # Errors
///
/// Only store failures are errors.
pub async fn decide(
    pool: &SqlitePool,
    principal: UserId,
    note_id: NoteId,
) -> Result<PermissionLevel, sqlx::Error> {
    match get_note(pool, note_id).await? {
        Some(note) => level_on(pool, principal, &note).await,
        None => Ok(PermissionLevel::None),
    }
}

/// Check that `principal` may perform `operation` on `note_id`
///
/// # Returns
///
/// The note and the level held, so callers do not fetch the note twice.
///
/// # Errors
///
/// * `AccessError::NotFound` - the note does not exist
/// * `AccessError::Forbidden` - the level is below `operation.required_level()`
/// * `AccessError::Persistence` - the store failed
pub async fn authorize(
    pool: &SqlitePool,
    principal: UserId,
    note_id: NoteId,
    operation: Operation,
) -> Result<(Note, PermissionLevel), AccessError> {
    let note = get_note(pool, note_id).await?.ok_or(AccessError::NotFound)?;
    let held = level_on(pool, principal, &note).await?;

    if !operation.permits(held) {
        tracing::debug!(
            "[Access] principal {} denied {:?} on note {} (holds {})",
            principal,
            operation,
            note_id,
            held
        );
        return Err(AccessError::Forbidden {
            held,
            required: operation.required_level(),
        });
    }

    Ok((note, held))
}

/// Validate the target of a collaborator grant
///
/// Runs after the caller has been authorized for
/// `Operation::ManageCollaborators`.
pub fn validate_grant_target(
    note: &Note,
    actor: UserId,
    target: UserId,
) -> Result<(), SharedError> {
    if target == actor {
        return Err(SharedError::validation(
            "email",
            "You cannot add yourself as a collaborator",
        ));
    }
    if target == note.user_id {
        return Err(SharedError::validation(
            "email",
            "The note owner cannot be added as a collaborator",
        ));
    }
    Ok(())
}
