//! Database test fixtures
//!
//! Every test gets its own in-memory SQLite database. The pool is capped at a
//! single connection because each `sqlite::memory:` connection is a separate
//! database.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Fresh migrated in-memory database
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}
