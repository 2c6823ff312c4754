/**
 * Note Update Pipeline
 *
 * Turns a `note-update` frame into a persisted edit and a room broadcast.
 *
 * # Stages
 *
 * ```text
 * Received → Identified → Authorized → Persisted → Broadcast
 * ```
 *
 * Any stage may reject the update; a rejected update is never persisted or
 * broadcast, and the connection stays open. The broadcast carries the
 * received payload text verbatim and goes to every member of the room,
 * including the sender.
 */
use std::sync::Arc;

use serde_json::value::RawValue;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::access::{authorize, AccessError, Operation};
use crate::backend::notes::db::{apply_edit, Note};
use crate::backend::realtime::registry::{ConnectionId, ConnectionRegistry, Frame};
use crate::shared::event::{NoteUpdatePayload, ServerEvent, UpdateRejectedNotice};
use crate::shared::{NoteId, SharedError};

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Identified,
    Authorized,
    Persisted,
    Broadcast,
}

/// Why an update was not applied
#[derive(Debug, Error)]
pub enum UpdateRejection {
    /// The connection has not presented a valid token
    #[error("connection is not authenticated")]
    Unauthenticated,
    /// The payload is not a valid note update
    #[error("invalid update: {0}")]
    Invalid(SharedError),
    /// The note does not exist
    #[error("note {0} not found")]
    NotFound(NoteId),
    /// The principal holds less than `Write`
    #[error("write access to note {0} denied")]
    Forbidden(NoteId),
    /// Writing the edit failed
    #[error("failed to persist update: {0}")]
    Persistence(#[source] sqlx::Error),
}

impl UpdateRejection {
    /// Last stage the update completed before it was stopped
    pub fn stage(&self) -> Stage {
        match self {
            Self::Unauthenticated => Stage::Received,
            Self::Invalid(_) | Self::NotFound(_) | Self::Forbidden(_) => Stage::Identified,
            Self::Persistence(_) => Stage::Authorized,
        }
    }

    /// Short machine-readable reason for `update-rejected` frames
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Invalid(_) => "invalid",
            Self::NotFound(_) => "not-found",
            Self::Forbidden(_) => "forbidden",
            Self::Persistence(_) => "persistence",
        }
    }
}

/// Result of an applied update
#[derive(Debug)]
pub struct UpdateOutcome {
    pub note: Note,
    /// Number of room members the frame was enqueued for
    pub delivered: usize,
}

/// Run one `note-update` through every stage
///
/// # Errors
///
/// Returns the `UpdateRejection` of the first stage that refused the update.
pub async fn apply_note_update(
    pool: &SqlitePool,
    registry: &ConnectionRegistry,
    connection: ConnectionId,
    raw: &RawValue,
) -> Result<UpdateOutcome, UpdateRejection> {
    // Identified
    let principal = registry
        .identity_of(connection)
        .ok_or(UpdateRejection::Unauthenticated)?;
    let payload = NoteUpdatePayload::from_raw(raw).map_err(UpdateRejection::Invalid)?;

    // Authorized
    authorize(pool, principal, payload.note_id, Operation::BroadcastUpdate)
        .await
        .map_err(|e| match e {
            AccessError::NotFound => UpdateRejection::NotFound(payload.note_id),
            AccessError::Forbidden { .. } => UpdateRejection::Forbidden(payload.note_id),
            AccessError::Persistence(e) => UpdateRejection::Persistence(e),
        })?;

    // Persisted
    let note = apply_edit(pool, payload.note_id, payload.title.as_deref(), &payload.content)
        .await
        .map_err(UpdateRejection::Persistence)?
        .ok_or(UpdateRejection::NotFound(payload.note_id))?;

    // Broadcast
    let frame = ServerEvent::NoteUpdated(raw)
        .to_frame()
        .map_err(UpdateRejection::Invalid)?;
    let delivered = registry.broadcast(note.id, Frame::from(frame));

    Ok(UpdateOutcome { note, delivered })
}

/// Run the pipeline for a socket and deal with a rejection
///
/// Rejections are logged. When `notify_rejected` is set the sender also
/// receives an `update-rejected` frame.
pub async fn handle_note_update(
    pool: &SqlitePool,
    registry: &ConnectionRegistry,
    connection: ConnectionId,
    raw: &RawValue,
    notify_rejected: bool,
) -> Option<UpdateOutcome> {
    match apply_note_update(pool, registry, connection, raw).await {
        Ok(outcome) => {
            tracing::debug!(
                "[Realtime] note {} updated by {}, delivered to {} member(s)",
                outcome.note.id,
                connection,
                outcome.delivered
            );
            Some(outcome)
        }
        Err(rejection) => {
            match &rejection {
                UpdateRejection::Persistence(e) => {
                    tracing::error!("[Realtime] update from {} not persisted: {:?}", connection, e)
                }
                other => tracing::warn!(
                    "[Realtime] update from {} rejected after {:?}: {}",
                    connection,
                    other.stage(),
                    other
                ),
            }

            if notify_rejected {
                let notice = UpdateRejectedNotice {
                    note_id: NoteUpdatePayload::peek_note_id(raw),
                    reason: rejection.reason().to_string(),
                };
                match ServerEvent::UpdateRejected(notice).to_frame() {
                    Ok(frame) => {
                        registry.send_to(connection, Frame::from(frame));
                    }
                    Err(e) => tracing::error!("[Realtime] failed to encode rejection: {}", e),
                }
            }
            None
        }
    }
}

/// Broadcast the stored state of a note after an HTTP edit
///
/// The payload has the same shape as a client `note-update`.
pub fn broadcast_note_state(registry: &ConnectionRegistry, note: &Note) -> usize {
    let payload = NoteUpdatePayload {
        note_id: note.id,
        title: Some(note.title.clone()),
        content: note.content.clone(),
    };
    let frame = serde_json::value::to_raw_value(&payload)
        .map_err(SharedError::from)
        .and_then(|raw| ServerEvent::NoteUpdated(&raw).to_frame());

    match frame {
        Ok(frame) => registry.broadcast(note.id, Arc::from(frame)),
        Err(e) => {
            tracing::error!("[Realtime] failed to encode note {}: {}", note.id, e);
            0
        }
    }
}
