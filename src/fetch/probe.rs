//! Metadata probing without downloading the resource body.
//!
//! A `HEAD` is tried first. Servers that reject or mishandle `HEAD` get a
//! ranged `GET` for the first byte instead; its body is dropped unread as
//! soon as headers arrive.

use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

use super::client::GuardedClient;
use super::constants::{FALLBACK_CONTENT_TYPE, PROBE_TIMEOUT, X_FILE_SIZE};
use super::error::FetchError;
use super::guard::TargetUrl;

/// Header-derived facts about a remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// Canonical form of the validated URL.
    pub url: String,
    /// Upstream content type, or `application/octet-stream`.
    pub content_type: String,
    /// Total size in bytes, when the server states one.
    pub content_length: Option<u64>,
    /// Whether the server advertises byte-range support.
    pub accepts_ranges: bool,
}

impl GuardedClient {
    /// Probes `target` for content type, length, and range support.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::FetchFailed`] if both the `HEAD` and the ranged
    /// fallback fail, or if the fallback answers with an error status.
    #[instrument(skip(self, target), fields(url = %target))]
    pub async fn probe(&self, target: &TargetUrl) -> Result<ProbeResult, FetchError> {
        match self.send(Method::HEAD, target, None, PROBE_TIMEOUT).await {
            Ok((_, response)) if response.status().is_success() => {
                debug!(status = %response.status(), "HEAD probe succeeded");
                return Ok(probe_from_headers(target, response.status(), response.headers()));
            }
            Ok((_, response)) => {
                debug!(status = %response.status(), "HEAD probe rejected, trying ranged GET");
            }
            Err(e) if e.is_validation() => return Err(e),
            Err(e) => {
                debug!(error = %e, "HEAD probe failed, trying ranged GET");
            }
        }

        let (_, response) = self
            .send(Method::GET, target, Some("bytes=0-0"), PROBE_TIMEOUT)
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::fetch_failed(
                target.as_str(),
                format!("probe answered HTTP {}", status.as_u16()),
            ));
        }

        // Dropping the response cancels the body without reading it.
        let result = probe_from_headers(target, status, response.headers());
        drop(response);
        Ok(result)
    }

    /// Content length reported by a `HEAD`, or `None` if it is unknown or the probe failed.
    pub async fn head_length(&self, target: &TargetUrl) -> Option<u64> {
        match self.send(Method::HEAD, target, None, PROBE_TIMEOUT).await {
            Ok((_, response)) if response.status().is_success() => {
                content_length(response.headers())
            }
            Ok((_, response)) => {
                debug!(status = %response.status(), "size pre-check skipped");
                None
            }
            Err(e) => {
                debug!(error = %e, "size pre-check skipped");
                None
            }
        }
    }
}

fn probe_from_headers(target: &TargetUrl, status: StatusCode, headers: &HeaderMap) -> ProbeResult {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    // A 206 answer's Content-Length only covers the one requested byte.
    let content_length = if status == StatusCode::PARTIAL_CONTENT {
        headers
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total)
            .or_else(|| vendor_length(headers))
    } else {
        content_length(headers)
    };

    let accepts_ranges = status == StatusCode::PARTIAL_CONTENT
        || headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.trim().eq_ignore_ascii_case("none"));

    ProbeResult {
        url: target.as_str().to_string(),
        content_type,
        content_length,
        accepts_ranges,
    }
}

/// `Content-Length`, falling back to the vendor `X-File-Size` header.
pub(crate) fn content_length(headers: &HeaderMap) -> Option<u64> {
    match headers.get(CONTENT_LENGTH) {
        Some(value) => value.to_str().ok().and_then(|v| v.trim().parse().ok()),
        None => vendor_length(headers),
    }
}

fn vendor_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(X_FILE_SIZE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Total from `bytes 0-0/1234`; `None` for `*` or malformed values.
fn content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::IpAddr;
    use std::sync::Arc;

    use reqwest::header::HeaderValue;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::fetch::guard::{AddressChecker, StaticResolver};
    use crate::test_support::socket_guard::start_mock_server_or_skip;

    fn public_client() -> GuardedClient {
        let addr: IpAddr = "93.184.216.34".parse().unwrap();
        GuardedClient::new(AddressChecker::new(Arc::new(StaticResolver::new(vec![addr])))).unwrap()
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_content_length_prefers_standard_header() {
        let map = headers(&[("content-length", "42"), ("x-file-size", "99")]);
        assert_eq!(content_length(&map), Some(42));
    }

    #[test]
    fn test_content_length_uses_vendor_header() {
        let map = headers(&[("x-file-size", "99")]);
        assert_eq!(content_length(&map), Some(99));
    }

    #[test]
    fn test_content_length_non_numeric_is_none() {
        let map = headers(&[("content-length", "lots")]);
        assert_eq!(content_length(&map), None);
        assert_eq!(content_length(&HeaderMap::new()), None);
    }

    #[test]
    fn test_content_range_total_parsing() {
        assert_eq!(content_range_total("bytes 0-0/1234"), Some(1234));
        assert_eq!(content_range_total("bytes 0-0/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[tokio::test]
    async fn test_probe_reads_head_headers() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("HEAD"))
            .and(path("/video.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .insert_header("accept-ranges", "bytes")
                    .insert_header("x-file-size", "2048")
                    .set_body_bytes(vec![0u8; 2048]),
            )
            .mount(&mock_server)
            .await;

        let client = public_client();
        let target = client
            .validate(&format!("{}/video.mp4", mock_server.uri()))
            .await
            .unwrap();
        let result = client.probe(&target).await.unwrap();

        assert_eq!(result.content_type, "video/mp4");
        assert_eq!(result.content_length, Some(2048));
        assert!(result.accepts_ranges);
        assert_eq!(result.url, target.as_str());
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_ranged_get() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("HEAD"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .and(header("range", "bytes=0-0"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-type", "application/zip")
                    .insert_header("content-range", "bytes 0-0/5000")
                    .set_body_bytes(b"P".to_vec()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = public_client();
        let target = client
            .validate(&format!("{}/file.bin", mock_server.uri()))
            .await
            .unwrap();
        let result = client.probe(&target).await.unwrap();

        assert_eq!(result.content_type, "application/zip");
        assert_eq!(result.content_length, Some(5000));
        assert!(result.accepts_ranges);
    }

    #[tokio::test]
    async fn test_probe_defaults_when_headers_missing() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("HEAD"))
            .and(path("/bare"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bare"))
            .respond_with(ResponseTemplate::new(206))
            .mount(&mock_server)
            .await;

        let client = public_client();
        let target = client
            .validate(&format!("{}/bare", mock_server.uri()))
            .await
            .unwrap();
        let result = client.probe(&target).await.unwrap();

        assert_eq!(result.content_type, FALLBACK_CONTENT_TYPE);
        assert_eq!(result.content_length, None);
    }

    #[tokio::test]
    async fn test_probe_fails_when_fallback_errors() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = public_client();
        let target = client
            .validate(&format!("{}/gone", mock_server.uri()))
            .await
            .unwrap();
        let result = client.probe(&target).await;

        assert!(matches!(result, Err(FetchError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_head_length_swallows_errors() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = public_client();
        let target = client
            .validate(&format!("{}/err", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(client.head_length(&target).await, None);
    }
}
