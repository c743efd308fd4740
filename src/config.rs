//! Server configuration and its validation.
//!
//! [`ConfigSource`] holds raw values as they arrive from flags or the
//! environment; [`ConfigSource::validate`] turns them into a [`ServerConfig`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::ApiKeys;
use crate::fetch::TransferLimits;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Configuration errors, reported before the server starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {source}")]
    InvalidBind {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("max bytes must be greater than zero")]
    ZeroCeiling,

    #[error("{missing} must be set together with {present}")]
    IncompleteKv {
        missing: &'static str,
        present: &'static str,
    },

    #[error("kv REST url '{0}' is not an http(s) URL")]
    InvalidKvUrl(String),
}

/// Which key/value backend to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvBackend {
    /// Process-local map.
    Memory,
    /// Upstash-compatible REST endpoint.
    Rest { url: String, token: String },
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub limits: TransferLimits,
    /// Notes database file; `None` disables the notes routes.
    pub database: Option<PathBuf>,
    pub api_keys: ApiKeys,
    pub kv: KvBackend,
}

/// Unvalidated configuration values.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub bind: String,
    pub max_bytes: u64,
    /// Zero disables the idle timeout.
    pub idle_timeout_secs: u64,
    pub database: Option<PathBuf>,
    /// Comma separated list.
    pub api_keys: Option<String>,
    pub kv_rest_url: Option<String>,
    pub kv_rest_token: Option<String>,
}

impl Default for ConfigSource {
    fn default() -> Self {
        let limits = TransferLimits::default();
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_bytes: limits.max_bytes,
            idle_timeout_secs: limits.idle_timeout.map_or(0, |idle| idle.as_secs()),
            database: None,
            api_keys: None,
            kv_rest_url: None,
            kv_rest_token: None,
        }
    }
}

impl ConfigSource {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unparseable bind address, a zero
    /// ceiling, or a KV URL/token set without the other.
    pub fn validate(self) -> Result<ServerConfig, ConfigError> {
        let bind = self
            .bind
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidBind {
                value: self.bind.clone(),
                source,
            })?;

        if self.max_bytes == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        let limits = TransferLimits {
            max_bytes: self.max_bytes,
            idle_timeout: (self.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(self.idle_timeout_secs)),
        };

        let kv = match (non_blank(self.kv_rest_url), non_blank(self.kv_rest_token)) {
            (None, None) => KvBackend::Memory,
            (Some(url), Some(token)) => {
                let is_http = Url::parse(&url)
                    .is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"));
                if !is_http {
                    return Err(ConfigError::InvalidKvUrl(url));
                }
                KvBackend::Rest { url, token }
            }
            (Some(_), None) => {
                return Err(ConfigError::IncompleteKv {
                    missing: "kv REST token",
                    present: "kv REST url",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteKv {
                    missing: "kv REST url",
                    present: "kv REST token",
                });
            }
        };

        Ok(ServerConfig {
            bind,
            limits,
            database: self.database,
            api_keys: self
                .api_keys
                .as_deref()
                .map(ApiKeys::from_comma_list)
                .unwrap_or_default(),
            kv,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ConfigSource::default().validate().unwrap();

        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.limits, TransferLimits::default());
        assert_eq!(config.kv, KvBackend::Memory);
        assert!(!config.api_keys.is_required());
        assert!(config.database.is_none());
    }

    #[test]
    fn test_zero_idle_disables_timeout() {
        let config = ConfigSource {
            idle_timeout_secs: 0,
            ..ConfigSource::default()
        }
        .validate()
        .unwrap();
        assert_eq!(config.limits.idle_timeout, None);
    }

    #[test]
    fn test_zero_ceiling_is_rejected() {
        let result = ConfigSource {
            max_bytes: 0,
            ..ConfigSource::default()
        }
        .validate();
        assert!(matches!(result, Err(ConfigError::ZeroCeiling)));
    }

    #[test]
    fn test_bad_bind_is_rejected() {
        let result = ConfigSource {
            bind: "localhost:http".to_string(),
            ..ConfigSource::default()
        }
        .validate();
        match result {
            Err(ConfigError::InvalidBind { value, .. }) => assert_eq!(value, "localhost:http"),
            other => panic!("Expected InvalidBind, got: {other:?}"),
        }
    }

    #[test]
    fn test_kv_requires_url_and_token_together() {
        let result = ConfigSource {
            kv_rest_url: Some("https://kv.example.com".to_string()),
            kv_rest_token: Some("  ".to_string()),
            ..ConfigSource::default()
        }
        .validate();
        assert!(matches!(
            result,
            Err(ConfigError::IncompleteKv {
                missing: "kv REST token",
                ..
            })
        ));
    }

    #[test]
    fn test_kv_rest_backend_selected() {
        let config = ConfigSource {
            kv_rest_url: Some("https://kv.example.com".to_string()),
            kv_rest_token: Some("token".to_string()),
            api_keys: Some("a,b".to_string()),
            ..ConfigSource::default()
        }
        .validate()
        .unwrap();

        assert_eq!(
            config.kv,
            KvBackend::Rest {
                url: "https://kv.example.com".to_string(),
                token: "token".to_string()
            }
        );
        assert_eq!(config.api_keys.len(), 2);
    }

    #[test]
    fn test_kv_url_must_be_http() {
        let result = ConfigSource {
            kv_rest_url: Some("redis://kv.example.com".to_string()),
            kv_rest_token: Some("token".to_string()),
            ..ConfigSource::default()
        }
        .validate();
        assert!(matches!(result, Err(ConfigError::InvalidKvUrl(_))));
    }
}
