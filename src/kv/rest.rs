//! Upstash-compatible Redis REST backend.
//!
//! Commands are posted as a JSON array (`["SET", key, value, "PX", ms]`)
//! with a bearer token; answers are `{"result": ...}` or `{"error": ...}`.
//! Values are stored as JSON text so any JSON value survives a round trip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{KvError, KvStore};
use crate::fetch::constants::CONNECT_TIMEOUT;

/// Overall timeout for one backend command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// REST client for a hosted Redis.
#[derive(Debug, Clone)]
pub struct RestKv {
    client: Client,
    url: String,
    token: String,
}

impl RestKv {
    /// # Errors
    ///
    /// Returns [`KvError::Transport`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self, KvError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(COMMAND_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, url, token))
    }

    #[must_use]
    pub fn with_client(client: Client, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    #[instrument(level = "debug", skip(self, command), fields(command = %command[0]))]
    async fn command(&self, command: Vec<Value>) -> Result<Value, KvError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        let status = response.status();
        let reply: CommandReply = response.json().await?;
        if let Some(message) = reply.error {
            return Err(KvError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(KvError::Backend {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }

        debug!(%status, "kv command answered");
        Ok(reply.result)
    }
}

#[async_trait]
impl KvStore for RestKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        let result = self
            .command(vec![Value::from("GET"), Value::from(key)])
            .await?;

        Ok(match result {
            Value::Null => None,
            // Text that is not JSON was written by another client; hand it back as a string.
            Value::String(text) => {
                Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
            }
            other => Some(other),
        })
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), KvError> {
        let mut command = vec![
            Value::from("SET"),
            Value::from(key),
            Value::from(serde_json::to_string(&value)?),
        ];
        if let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) {
            let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
            command.push(Value::from("PX"));
            command.push(Value::from(millis));
        }

        self.command(command).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.command(vec![Value::from("DEL"), Value::from(key)])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::test_support::socket_guard::start_mock_server_or_skip;

    #[tokio::test]
    async fn test_rest_kv_set_with_ttl_sends_px() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!(["SET", "k", "{\"a\":1}", "PX", 30_000])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let kv = RestKv::new(mock_server.uri(), "secret").unwrap();
        kv.set("k", json!({"a": 1}), Some(Duration::from_secs(30)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rest_kv_get_decodes_json_text() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(body_json(json!(["GET", "k"])))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": "{\"a\":1}"})),
            )
            .mount(&mock_server)
            .await;

        let kv = RestKv::new(mock_server.uri(), "secret").unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_rest_kv_get_missing_is_none() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
            .mount(&mock_server)
            .await;

        let kv = RestKv::new(mock_server.uri(), "secret").unwrap();
        assert_eq!(kv.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rest_kv_get_plain_text_passthrough() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "hello"})))
            .mount(&mock_server)
            .await;

        let kv = RestKv::new(mock_server.uri(), "secret").unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some(json!("hello")));
    }

    #[tokio::test]
    async fn test_rest_kv_error_payload_is_backend_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})),
            )
            .mount(&mock_server)
            .await;

        let kv = RestKv::new(mock_server.uri(), "wrong").unwrap();
        let result = kv.delete("k").await;

        match result {
            Err(KvError::Backend { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("Expected Backend error, got: {other:?}"),
        }
    }
}
