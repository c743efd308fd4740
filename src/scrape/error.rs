//! Error types for page inspection.

use std::time::Duration;

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that can occur while inspecting a page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Validation or transport failure from the guarded client.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Converter sites answer bots with challenge pages only.
    #[error("converter site {host} cannot be scraped")]
    ConverterSite {
        /// Host that matched the converter list.
        host: String,
    },

    /// No complete response within the page timeout.
    #[error("no complete response from {url} within {}s", after.as_secs())]
    Timeout {
        /// Requested URL.
        url: String,
        /// Timeout that elapsed.
        after: Duration,
    },

    /// Upstream answered with a non-success status.
    #[error("{url} answered HTTP {status}")]
    HttpStatus {
        /// Final URL after redirects.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

impl ScrapeError {
    /// Short caller-facing message.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Fetch(FetchError::FetchFailed { .. }) => {
                "Invalid or unreachable URL.".to_string()
            }
            Self::Fetch(e) => e.client_message(),
            Self::ConverterSite { .. } => {
                "ytmp3/y2mate sites blocked by anti-bot protection. Cannot scrape directly."
                    .to_string()
            }
            Self::Timeout { .. } => "Request timeout: site slow or unresponsive.".to_string(),
            Self::HttpStatus { status, .. } => match status {
                403 => "Access forbidden: site blocks automated requests.".to_string(),
                429 => "Rate limited: too many requests. Wait and retry.".to_string(),
                404 | 410 => "Content not available (private/deleted).".to_string(),
                _ => "Site server error, try again later.".to_string(),
            },
        }
    }
}
