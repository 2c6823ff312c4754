//! Collaborator HTTP Handlers
//!
//! Grant management for `/api/collaborators`. Listing needs Read on the
//! note; every change needs Admin. Target validation (self, owner, unknown
//! level) runs only after the Admin check passes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::access::{authorize, validate_grant_target, Operation};
use crate::backend::auth::handlers::MessageResponse;
use crate::backend::auth::users::get_user_by_email;
use crate::backend::collaborators::db::{self, Collaborator, SharedNote};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::{NoteId, PermissionLevel, UserId};

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    #[serde(default)]
    pub email: String,
    /// Defaults to `read`
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCollaboratorRequest {
    #[serde(default)]
    pub permission: String,
}

#[derive(Debug, Serialize)]
pub struct CollaboratorsResponse {
    pub collaborators: Vec<Collaborator>,
}

#[derive(Debug, Serialize)]
pub struct CollaboratorResponse {
    pub collaborator: Collaborator,
}

#[derive(Debug, Serialize)]
pub struct SharedNotesResponse {
    pub notes: Vec<SharedNote>,
}

/// List grants on a note (Read)
pub async fn list_collaborators(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<NoteId>,
) -> Result<Json<CollaboratorsResponse>, BackendError> {
    authorize(&state.pool, auth.id(), note_id, Operation::ListCollaborators).await?;
    let collaborators = db::list_collaborators(&state.pool, note_id).await?;
    Ok(Json(CollaboratorsResponse { collaborators }))
}

/// Grant a user access to a note by email (Admin)
///
/// # Errors
///
/// * `400 Bad Request` - Invalid permission, self or owner as target
/// * `404 Not Found` - Note or user unknown
/// * `409 Conflict` - The user already has a grant on the note
pub async fn add_collaborator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<NoteId>,
    Json(request): Json<AddCollaboratorRequest>,
) -> Result<(StatusCode, Json<CollaboratorResponse>), BackendError> {
    let (note, _) = authorize(
        &state.pool,
        auth.id(),
        note_id,
        Operation::ManageCollaborators,
    )
    .await?;

    let level = match request.permission.as_deref() {
        Some(raw) => PermissionLevel::parse_grant(raw)?,
        None => PermissionLevel::Read,
    };

    let email = request.email.trim().to_lowercase();
    let target = get_user_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    validate_grant_target(&note, auth.id(), target.id)?;

    let collaborator = db::add_collaborator(&state.pool, note_id, target.id, level)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BackendError::conflict("User is already a collaborator on this note")
            }
            other => BackendError::from(other),
        })?;

    tracing::info!(
        "User {} granted {} on note {} by {}",
        target.id,
        level,
        note_id,
        auth.id()
    );
    Ok((StatusCode::CREATED, Json(CollaboratorResponse { collaborator })))
}

/// Change a collaborator's level (Admin)
pub async fn update_collaborator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((note_id, user_id)): Path<(NoteId, UserId)>,
    Json(request): Json<UpdateCollaboratorRequest>,
) -> Result<Json<CollaboratorResponse>, BackendError> {
    authorize(&state.pool, auth.id(), note_id, Operation::ManageCollaborators).await?;
    let level = PermissionLevel::parse_grant(&request.permission)?;

    let collaborator = db::update_collaborator(&state.pool, note_id, user_id, level)
        .await?
        .ok_or_else(|| BackendError::not_found("Collaborator not found"))?;

    tracing::info!("User {} now holds {} on note {}", user_id, level, note_id);
    Ok(Json(CollaboratorResponse { collaborator }))
}

/// Revoke a collaborator's grant (Admin)
pub async fn remove_collaborator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((note_id, user_id)): Path<(NoteId, UserId)>,
) -> Result<Json<MessageResponse>, BackendError> {
    authorize(&state.pool, auth.id(), note_id, Operation::ManageCollaborators).await?;

    if !db::remove_collaborator(&state.pool, note_id, user_id).await? {
        return Err(BackendError::not_found("Collaborator not found"));
    }

    tracing::info!("User {} removed from note {} by {}", user_id, note_id, auth.id());
    Ok(Json(MessageResponse::new("Collaborator removed successfully")))
}

/// Notes other users shared with the caller
pub async fn shared_with_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SharedNotesResponse>, BackendError> {
    let notes = db::shared_with(&state.pool, auth.id()).await?;
    Ok(Json(SharedNotesResponse { notes }))
}
