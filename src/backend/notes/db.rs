/**
 * Notes Database Operations
 *
 * Row type and queries for the `notes` table. Every write binds its own
 * `updated_at` from `Utc::now()` so timestamps round-trip as `DateTime<Utc>`.
 *
 * Access checks do not happen here; callers go through `backend::access`
 * first.
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::shared::{NoteId, UserId};

/// A note row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Owner
    pub user_id: UserId,
    pub category: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a new note
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub is_public: bool,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

/// Listing filter
///
/// A non-empty `search` takes precedence over `category`.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

const NOTE_COLUMNS: &str =
    "id, title, content, user_id, category, is_public, created_at, updated_at";

/// Insert a note owned by `owner`
pub async fn create_note(
    pool: &SqlitePool,
    owner: UserId,
    note: &NewNote,
) -> Result<Note, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Note>(&format!(
        r#"
        INSERT INTO notes (title, content, user_id, category, is_public, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {NOTE_COLUMNS}
        "#
    ))
    .bind(&note.title)
    .bind(&note.content)
    .bind(owner)
    .bind(&note.category)
    .bind(note.is_public)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Fetch a note by id
pub async fn get_note(pool: &SqlitePool, id: NoteId) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// List the notes owned by `owner`, most recently updated first
pub async fn list_notes_for_owner(
    pool: &SqlitePool,
    owner: UserId,
    filter: &NoteFilter,
) -> Result<Vec<Note>, sqlx::Error> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let category = filter
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    if let Some(search) = search {
        let pattern = format!("%{}%", escape_like(search));
        return sqlx::query_as::<_, Note>(&format!(
            r#"
            SELECT {NOTE_COLUMNS} FROM notes
            WHERE user_id = ? AND (title LIKE ? ESCAPE '\' OR content LIKE ? ESCAPE '\')
            ORDER BY updated_at DESC, id DESC
            "#
        ))
        .bind(owner)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(pool)
        .await;
    }

    if let Some(category) = category {
        return sqlx::query_as::<_, Note>(&format!(
            r#"
            SELECT {NOTE_COLUMNS} FROM notes
            WHERE user_id = ? AND category = ?
            ORDER BY updated_at DESC, id DESC
            "#
        ))
        .bind(owner)
        .bind(category)
        .fetch_all(pool)
        .await;
    }

    sqlx::query_as::<_, Note>(&format!(
        r#"
        SELECT {NOTE_COLUMNS} FROM notes
        WHERE user_id = ?
        ORDER BY updated_at DESC, id DESC
        "#
    ))
    .bind(owner)
    .fetch_all(pool)
    .await
}

/// Escape `LIKE` wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Apply a partial update and refresh `updated_at`
///
/// Returns `None` when the note does not exist.
pub async fn update_note(
    pool: &SqlitePool,
    id: NoteId,
    changes: &NoteChanges,
) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>(&format!(
        r#"
        UPDATE notes
        SET title = COALESCE(?, title),
            content = COALESCE(?, content),
            category = COALESCE(?, category),
            is_public = COALESCE(?, is_public),
            updated_at = ?
        WHERE id = ?
        RETURNING {NOTE_COLUMNS}
        "#
    ))
    .bind(&changes.title)
    .bind(&changes.content)
    .bind(&changes.category)
    .bind(changes.is_public)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Persist a real-time edit: content always, title only when present
pub async fn apply_edit(
    pool: &SqlitePool,
    id: NoteId,
    title: Option<&str>,
    content: &str,
) -> Result<Option<Note>, sqlx::Error> {
    let changes = NoteChanges {
        title: title.map(str::to_string),
        content: Some(content.to_string()),
        ..NoteChanges::default()
    };
    update_note(pool, id, &changes).await
}

/// Delete a note; collaborator rows go with it
///
/// Returns whether a row was removed.
pub async fn delete_note(pool: &SqlitePool, id: NoteId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
