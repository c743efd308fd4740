//! Note storage backed by `SQLite`.
//!
//! [`NoteStore`] owns the CRUD operations behind the `/notes` routes. Input
//! is trimmed and validated here so the HTTP layer only maps errors.
//!
//! # Example
//!
//! ```no_run
//! use downloader_api::{Database, NoteStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new_in_memory().await?;
//! let notes = NoteStore::new(db);
//!
//! let note = notes.create("groceries", "eggs, milk").await?;
//! let latest = notes.list(10).await?;
//! assert_eq!(latest[0].id, note.id);
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::{NoteDbErrorKind, NoteError};

use serde::Serialize;
use sqlx::FromRow;
use tracing::{debug, instrument};

use crate::db::Database;

/// Maximum rows returned by [`NoteStore::list`].
pub const MAX_LIST_LIMIT: i64 = 100;

/// Result type for note operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// UTC ISO-8601 text, set by `SQLite`.
    pub created_at: String,
    /// UTC ISO-8601 text, refreshed on every update.
    pub updated_at: String,
}

/// Partial update; `None` (or blank) fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    fn normalized(self) -> Self {
        Self {
            title: self.title.filter(|t| !t.is_empty()),
            content: self.content.filter(|c| !c.is_empty()),
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// CRUD access to the `notes` table.
#[derive(Debug, Clone)]
pub struct NoteStore {
    db: Database,
}

impl NoteStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest notes first, at most `limit` (capped at [`MAX_LIST_LIMIT`]).
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64) -> Result<Vec<Note>> {
        let limit = limit.clamp(0, MAX_LIST_LIMIT);
        let notes = sqlx::query_as::<_, Note>(
            r"SELECT id, title, content, created_at, updated_at
              FROM notes ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(notes)
    }

    /// # Errors
    ///
    /// Returns [`NoteError::NotFound`] for an unknown id.
    /// Returns [`NoteError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Note> {
        sqlx::query_as::<_, Note>(
            r"SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(NoteError::NotFound(id))
    }

    /// Inserts a note. Both fields are trimmed and must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::Invalid`] if either field is blank.
    /// Returns [`NoteError::Database`] if the insert fails.
    #[instrument(skip(self, title, content))]
    pub async fn create(&self, title: &str, content: &str) -> Result<Note> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(NoteError::Invalid("title & content wajib"));
        }

        let note = sqlx::query_as::<_, Note>(
            r"INSERT INTO notes (title, content) VALUES (?, ?)
              RETURNING id, title, content, created_at, updated_at",
        )
        .bind(title)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        debug!(id = note.id, "note created");
        Ok(note)
    }

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::Invalid`] if the update carries no field.
    /// Returns [`NoteError::NotFound`] for an unknown id.
    /// Returns [`NoteError::Database`] if the update fails.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: NoteUpdate) -> Result<Note> {
        let update = update.normalized();
        if update.is_empty() {
            return Err(NoteError::Invalid("title atau content harus ada"));
        }

        sqlx::query_as::<_, Note>(
            r"UPDATE notes
              SET title = COALESCE(?, title),
                  content = COALESCE(?, content),
                  updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
              WHERE id = ?
              RETURNING id, title, content, created_at, updated_at",
        )
        .bind(update.title)
        .bind(update.content)
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(NoteError::NotFound(id))
    }

    /// Deletes a note. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::Database`] if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(r"DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
