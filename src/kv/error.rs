//! Error types for key/value storage.

use thiserror::Error;

/// Errors raised by a [`KvStore`](super::KvStore) backend.
#[derive(Debug, Error)]
pub enum KvError {
    /// The REST backend could not be reached.
    #[error("kv backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The REST backend answered with an error status or error payload.
    #[error("kv backend rejected command ({status}): {message}")]
    Backend {
        /// HTTP status of the backend answer.
        status: u16,
        /// Backend-supplied error text.
        message: String,
    },

    /// A value could not be encoded/decoded as JSON.
    #[error("kv value is not valid JSON: {0}")]
    Codec(#[from] serde_json::Error),
}
