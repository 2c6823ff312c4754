//! Notes HTTP Handlers
//!
//! CRUD handlers for `/api/notes`. Every handler runs behind
//! `auth_middleware`; per-note checks go through `access::authorize`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::access::{authorize, Operation};
use crate::backend::auth::handlers::MessageResponse;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::notes::db::{self, NewNote, Note, NoteChanges, NoteFilter};
use crate::backend::realtime::pipeline::broadcast_note_state;
use crate::backend::server::state::AppState;
use crate::shared::{NoteId, PermissionLevel, SharedError};

/// Query string of `GET /api/notes`
#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note: Note,
}

#[derive(Debug, Serialize)]
pub struct NoteWithPermission {
    pub note: Note,
    pub permission: PermissionLevel,
}

fn require_title(title: &str) -> Result<String, SharedError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SharedError::validation("title", "Title is required"));
    }
    Ok(title.to_string())
}

/// List the caller's own notes, newest first
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<NotesResponse>, BackendError> {
    let filter = NoteFilter {
        category: query.category,
        search: query.search,
    };
    let notes = db::list_notes_for_owner(&state.pool, auth.id(), &filter).await?;
    tracing::debug!("Listed {} notes for user {}", notes.len(), auth.id());
    Ok(Json(NotesResponse { notes }))
}

/// Create a note owned by the caller
///
/// # Errors
///
/// * `400 Bad Request` - Empty title
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), BackendError> {
    let new_note = NewNote {
        title: require_title(&request.title)?,
        content: request.content.unwrap_or_default(),
        category: request.category,
        is_public: request.is_public.unwrap_or(false),
    };

    let note = db::create_note(&state.pool, auth.id(), &new_note).await?;
    tracing::info!("Note {} created by user {}", note.id, auth.id());
    Ok((StatusCode::CREATED, Json(NoteResponse { note })))
}

/// Fetch one note with the caller's permission level (Read)
pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NoteId>,
) -> Result<Json<NoteWithPermission>, BackendError> {
    let (note, permission) = authorize(&state.pool, auth.id(), id, Operation::ViewNote).await?;
    Ok(Json(NoteWithPermission { note, permission }))
}

/// Update a note (Write)
///
/// The stored state is pushed to the note's room as `note-updated`, so
/// sockets watching the note see HTTP edits too.
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NoteId>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, BackendError> {
    authorize(&state.pool, auth.id(), id, Operation::EditNote).await?;

    let title = request.title.as_deref().map(require_title).transpose()?;
    let changes = NoteChanges {
        title,
        content: request.content,
        category: request.category,
        is_public: request.is_public,
    };

    let note = db::update_note(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| BackendError::not_found("Note not found"))?;

    let delivered = broadcast_note_state(&state.registry, &note);
    tracing::info!("Note {} updated by user {} ({} live recipients)", id, auth.id(), delivered);
    Ok(Json(NoteResponse { note }))
}

/// Delete a note (Admin)
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NoteId>,
) -> Result<Json<MessageResponse>, BackendError> {
    authorize(&state.pool, auth.id(), id, Operation::DeleteNote).await?;

    if !db::delete_note(&state.pool, id).await? {
        return Err(BackendError::not_found("Note not found"));
    }

    tracing::info!("Note {} deleted by user {}", id, auth.id());
    Ok(Json(MessageResponse::new("Note deleted successfully")))
}
