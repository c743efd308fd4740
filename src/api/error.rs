//! Error envelope for every failed route.
//!
//! Module errors convert into [`ApiError`], which renders
//! `{ "ok": false, "error": message }`. Detailed error text goes to the log;
//! callers only see the short message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::fetch::FetchError;
use crate::kv::KvError;
use crate::notes::NoteError;
use crate::scrape::ScrapeError;

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    ok: bool,
    error: &'a str,
}

/// A failed request: status plus caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    #[must_use]
    pub fn notes_disabled() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Database belum dikonfigurasi")
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            ok: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        warn!(error = %err, "guarded fetch failed");
        let status = match err {
            FetchError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.client_message())
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::Invalid(message) => Self::bad_request(message),
            NoteError::NotFound(_) => Self::not_found(),
            NoteError::Database { kind, .. } if kind.is_temporary() => {
                warn!(error = %err, %kind, "note storage temporarily unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "DB error")
            }
            NoteError::Database { kind, .. } => {
                error!(error = %err, %kind, "note storage failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "DB error")
            }
        }
    }
}

impl From<KvError> for ApiError {
    fn from(err: KvError) -> Self {
        error!(error = %err, "kv storage failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "KV error")
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        warn!(error = %err, "page inspection failed");
        let status = match &err {
            ScrapeError::Fetch(FetchError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ScrapeError::Fetch(_) => StatusCode::BAD_REQUEST,
            ScrapeError::ConverterSite { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ScrapeError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ScrapeError::HttpStatus { status, .. } => match status {
                403 => StatusCode::FORBIDDEN,
                429 => StatusCode::TOO_MANY_REQUESTS,
                404 | 410 => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
        };
        Self::new(status, err.client_message())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use axum::body::to_bytes;

    use super::*;

    #[tokio::test]
    async fn test_api_error_renders_envelope() {
        let response = ApiError::bad_request("Parameter ?url= wajib").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "Parameter ?url= wajib"}));
    }

    #[test]
    fn test_fetch_error_status_mapping() {
        let blocked: ApiError =
            FetchError::ssrf_blocked("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST)).into();
        assert_eq!(blocked.status(), StatusCode::BAD_REQUEST);
        assert_eq!(blocked.message(), "Akses ke IP privat diblokir");

        let too_large: ApiError = FetchError::too_large(100).into();
        assert_eq!(too_large.status(), StatusCode::BAD_REQUEST);

        let upstream: ApiError = FetchError::upstream_unavailable("https://example.com", 503).into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.message(), "Sumber tidak bisa diunduh");
    }

    #[test]
    fn test_note_error_hides_database_detail() {
        let err: ApiError = NoteError::Database {
            kind: crate::notes::NoteDbErrorKind::Other,
            message: "disk I/O error at /var/lib/notes.db".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("/var/lib"));
    }

    #[test]
    fn test_temporary_database_errors_are_unavailable() {
        let busy: ApiError = NoteError::Database {
            kind: crate::notes::NoteDbErrorKind::BusyOrLocked,
            message: "database is locked".to_string(),
        }
        .into();
        assert_eq!(busy.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(busy.message(), "DB error");

        let pool: ApiError = NoteError::from(sqlx::Error::PoolTimedOut).into();
        assert_eq!(pool.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_scrape_error_status_mapping() {
        let cases = [
            (
                ScrapeError::Timeout {
                    url: "u".to_string(),
                    after: Duration::from_secs(8),
                },
                StatusCode::REQUEST_TIMEOUT,
            ),
            (
                ScrapeError::HttpStatus {
                    url: "u".to_string(),
                    status: 429,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ScrapeError::HttpStatus {
                    url: "u".to_string(),
                    status: 500,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ScrapeError::ConverterSite {
                    host: "ytmp3.cc".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
