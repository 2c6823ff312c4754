/**
 * Collaborator Database Operations
 *
 * Queries for the `collaborators` table. A row grants one user a
 * `PermissionLevel` on one note; `UNIQUE(note_id, user_id)` keeps it to at
 * most one grant per pair. Listing joins `users` so clients get the
 * collaborator's email and name alongside the grant.
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::backend::notes::db::Note;
use crate::shared::{NoteId, PermissionLevel, UserId};

/// A collaborator grant joined with the collaborator's user row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Collaborator {
    pub id: i64,
    pub note_id: NoteId,
    pub user_id: UserId,
    pub permission: PermissionLevel,
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub name: String,
}

/// A note shared with the caller and the level they hold on it
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SharedNote {
    #[sqlx(flatten)]
    pub note: Note,
    pub permission: PermissionLevel,
}

const COLLABORATOR_SELECT: &str = r#"
    SELECT c.id, c.note_id, c.user_id, c.permission, c.created_at, u.email, u.name
    FROM collaborators c
    JOIN users u ON u.id = c.user_id
"#;

/// Level granted to `user_id` on `note_id`, if any
pub async fn permission_for(
    pool: &SqlitePool,
    note_id: NoteId,
    user_id: UserId,
) -> Result<Option<PermissionLevel>, sqlx::Error> {
    sqlx::query_scalar::<_, PermissionLevel>(
        "SELECT permission FROM collaborators WHERE note_id = ? AND user_id = ?",
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// All collaborators of a note, oldest grant first
pub async fn list_collaborators(
    pool: &SqlitePool,
    note_id: NoteId,
) -> Result<Vec<Collaborator>, sqlx::Error> {
    sqlx::query_as::<_, Collaborator>(&format!(
        "{COLLABORATOR_SELECT} WHERE c.note_id = ? ORDER BY c.created_at, c.id"
    ))
    .bind(note_id)
    .fetch_all(pool)
    .await
}

/// One collaborator row
pub async fn get_collaborator(
    pool: &SqlitePool,
    note_id: NoteId,
    user_id: UserId,
) -> Result<Option<Collaborator>, sqlx::Error> {
    sqlx::query_as::<_, Collaborator>(&format!(
        "{COLLABORATOR_SELECT} WHERE c.note_id = ? AND c.user_id = ?"
    ))
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Grant `level` to `user_id` on `note_id`
///
/// # Errors
///
/// A second grant for the same pair fails with a unique-constraint violation;
/// callers map it to a conflict.
pub async fn add_collaborator(
    pool: &SqlitePool,
    note_id: NoteId,
    user_id: UserId,
    level: PermissionLevel,
) -> Result<Collaborator, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO collaborators (note_id, user_id, permission, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .bind(level)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    get_collaborator(pool, note_id, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Change the level of an existing grant
///
/// Returns `None` when no grant exists for the pair.
pub async fn update_collaborator(
    pool: &SqlitePool,
    note_id: NoteId,
    user_id: UserId,
    level: PermissionLevel,
) -> Result<Option<Collaborator>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE collaborators SET permission = ? WHERE note_id = ? AND user_id = ?",
    )
    .bind(level)
    .bind(note_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_collaborator(pool, note_id, user_id).await
}

/// Revoke a grant; returns whether a row was removed
pub async fn remove_collaborator(
    pool: &SqlitePool,
    note_id: NoteId,
    user_id: UserId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM collaborators WHERE note_id = ? AND user_id = ?")
        .bind(note_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Notes on which `user_id` holds a grant, most recently updated first
pub async fn shared_with(
    pool: &SqlitePool,
    user_id: UserId,
) -> Result<Vec<SharedNote>, sqlx::Error> {
    sqlx::query_as::<_, SharedNote>(
        r#"
        SELECT n.id, n.title, n.content, n.user_id, n.category, n.is_public,
               n.created_at, n.updated_at, c.permission
        FROM notes n
        JOIN collaborators c ON c.note_id = n.id
        WHERE c.user_id = ?
        ORDER BY n.updated_at DESC, n.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
