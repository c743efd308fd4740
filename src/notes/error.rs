//! Error types for note storage.

use std::fmt;

use sqlx::error::ErrorKind;
use thiserror::Error;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT: i32 = 19;

/// Coarse classification of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteDbErrorKind {
    /// `SQLite` reported `SQLITE_BUSY` or `SQLITE_LOCKED`.
    BusyOrLocked,
    /// A unique, not-null, check, or foreign-key constraint rejected the write.
    ConstraintViolation,
    /// No pooled connection became free in time.
    PoolTimeout,
    /// The pool was closed (shutdown in progress).
    PoolClosed,
    Other,
}

impl NoteDbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::Database(database_error) => {
                if !matches!(database_error.kind(), ErrorKind::Other) {
                    return Self::ConstraintViolation;
                }
                // Extended result codes keep the primary code in the low byte.
                let primary = database_error
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                match primary {
                    Some(SQLITE_BUSY | SQLITE_LOCKED) => Self::BusyOrLocked,
                    Some(SQLITE_CONSTRAINT) => Self::ConstraintViolation,
                    _ => Self::Other,
                }
            }
            _ => Self::Other,
        }
    }

    /// Failures that clear up on their own; the request may be repeated.
    #[must_use]
    pub fn is_temporary(self) -> bool {
        matches!(
            self,
            Self::BusyOrLocked | Self::PoolTimeout | Self::PoolClosed
        )
    }
}

impl fmt::Display for NoteDbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::Other => "other",
        })
    }
}

/// Errors that can occur during note operations.
#[derive(Debug, Clone, Error)]
pub enum NoteError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        /// Typed classification of the failure.
        kind: NoteDbErrorKind,
        /// Driver error text. Logged, never shown to callers.
        message: String,
    },

    /// No note has this id.
    #[error("note not found: id {0}")]
    NotFound(i64),

    /// Input failed validation; the message is caller-facing.
    #[error("invalid note input: {0}")]
    Invalid(&'static str),
}

impl From<sqlx::Error> for NoteError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: NoteDbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}
