//! Error types for the guarded fetch pipeline.
//!
//! `Display` output carries full context and is meant for logs. Callers get
//! the short [`FetchError::client_message`] text instead, which never exposes
//! resolved addresses or upstream error chains.

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while validating, probing, or streaming a remote resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Input did not parse as an absolute URL with a host.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
    },

    /// URL scheme is anything other than `http`/`https`.
    #[error("unsupported URL scheme '{scheme}'")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// Hostname resolved to at least one private, loopback, or link-local address.
    #[error("blocked request to {host}: resolves to non-public address {addr}")]
    SsrfBlocked {
        /// Host named in the URL.
        host: String,
        /// First offending address.
        addr: IpAddr,
    },

    /// Network error, timeout, or unusable response while fetching.
    #[error("fetch failed for {url}: {reason}")]
    FetchFailed {
        /// The URL being fetched.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// Known or observed size exceeds the transfer ceiling.
    #[error("resource exceeds size limit of {limit} bytes")]
    TooLarge {
        /// The configured ceiling.
        limit: u64,
    },

    /// Upstream answered the transfer GET with a non-success status.
    #[error("upstream {url} unavailable (HTTP {status})")]
    UpstreamUnavailable {
        /// The URL being fetched.
        url: String,
        /// Upstream status code.
        status: u16,
    },

    /// No body chunk arrived within the idle window.
    #[error("upstream stalled for more than {idle:?}")]
    IdleTimeout {
        /// The idle window that elapsed.
        idle: Duration,
    },

    /// Upstream body failed after streaming began.
    #[error("upstream body error: {source}")]
    Stream {
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unsupported scheme error.
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            scheme: scheme.into(),
        }
    }

    /// Creates an SSRF block error.
    pub fn ssrf_blocked(host: impl Into<String>, addr: IpAddr) -> Self {
        Self::SsrfBlocked {
            host: host.into(),
            addr,
        }
    }

    /// Creates a fetch failure with a reason.
    pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a size-ceiling error.
    #[must_use]
    pub fn too_large(limit: u64) -> Self {
        Self::TooLarge { limit }
    }

    /// Creates an upstream-unavailable error.
    pub fn upstream_unavailable(url: impl Into<String>, status: u16) -> Self {
        Self::UpstreamUnavailable {
            url: url.into(),
            status,
        }
    }

    /// Wraps a transport error raised mid-stream.
    pub fn stream(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Stream {
            source: Box::new(source),
        }
    }

    /// Short message safe to return to API callers.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidUrl { .. } => "URL tidak valid".to_string(),
            Self::UnsupportedScheme { .. } => "Hanya http/https yang diizinkan".to_string(),
            Self::SsrfBlocked { .. } => "Akses ke IP privat diblokir".to_string(),
            Self::FetchFailed { .. } => "Gagal mengambil data dari sumber".to_string(),
            Self::TooLarge { limit } => format!("Ukuran file melebihi batas ({limit} bytes)"),
            Self::UpstreamUnavailable { .. } => "Sumber tidak bisa diunduh".to_string(),
            Self::IdleTimeout { .. } | Self::Stream { .. } => "Transfer terputus".to_string(),
        }
    }

    /// Returns true for errors raised before any request left the process.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::UnsupportedScheme { .. } | Self::SsrfBlocked { .. }
        )
    }
}
