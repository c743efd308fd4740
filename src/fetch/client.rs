//! Outbound HTTP client that only talks to validated targets.
//!
//! Automatic redirects are disabled on the underlying `reqwest` client.
//! [`GuardedClient::send`] follows them by hand and runs every hop back
//! through the [`AddressChecker`], so a public host cannot bounce a request
//! into the private network.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, LOCATION, RANGE};
use reqwest::{Client, Method, StatusCode, redirect};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT, MAX_REDIRECTS};
use super::error::FetchError;
use super::guard::{AddressChecker, TargetUrl};
use crate::user_agent;

/// HTTP client pairing a pooled `reqwest::Client` with an address checker.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GuardedClient {
    client: Client,
    checker: AddressChecker,
}

impl GuardedClient {
    /// Builds a client with redirects disabled and the tool User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::FetchFailed`] if the TLS backend cannot be initialised.
    pub fn new(checker: AddressChecker) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(user_agent::default_fetch_user_agent())
            .build()
            .map_err(|e| FetchError::fetch_failed("<client>", e.to_string()))?;
        Ok(Self { client, checker })
    }

    /// Validates a caller-supplied URL string.
    ///
    /// # Errors
    ///
    /// See [`AddressChecker::check`].
    pub async fn validate(&self, input: &str) -> Result<TargetUrl, FetchError> {
        self.checker.check(input).await
    }

    /// Sends `method` to `target`, following up to [`MAX_REDIRECTS`] validated hops.
    ///
    /// `timeout` bounds the whole redirect chain until the final response
    /// headers arrive; reading the body afterwards is not covered by it.
    ///
    /// Returns the final hop's URL alongside the response. Non-success statuses
    /// are returned as-is for the caller to interpret.
    ///
    /// # Errors
    ///
    /// - [`FetchError::FetchFailed`] on network errors, timeouts, or too many redirects
    /// - any checker error raised by a redirect hop
    pub async fn send(
        &self,
        method: Method,
        target: &TargetUrl,
        range: Option<&str>,
        timeout: Duration,
    ) -> Result<(TargetUrl, reqwest::Response), FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(range) = range {
            let value = HeaderValue::from_str(range)
                .map_err(|e| FetchError::fetch_failed(target.as_str(), e.to_string()))?;
            headers.insert(RANGE, value);
        }
        self.send_with_headers(method, target, &headers, timeout)
            .await
    }

    /// Like [`send`](Self::send), attaching `headers` to every hop.
    ///
    /// A `User-Agent` in `headers` replaces the client default.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    #[instrument(level = "debug", skip(self, target, headers), fields(url = %target))]
    pub async fn send_with_headers(
        &self,
        method: Method,
        target: &TargetUrl,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<(TargetUrl, reqwest::Response), FetchError> {
        match tokio::time::timeout(timeout, self.follow_redirects(method, target, headers)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::fetch_failed(
                target.as_str(),
                format!("no response within {}s", timeout.as_secs_f64()),
            )),
        }
    }

    async fn follow_redirects(
        &self,
        method: Method,
        target: &TargetUrl,
        headers: &HeaderMap,
    ) -> Result<(TargetUrl, reqwest::Response), FetchError> {
        let mut current = target.clone();

        for hop in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .request(method.clone(), current.as_url().clone())
                .headers(headers.clone())
                .send()
                .await
                .map_err(|e| {
                    let reason = if e.is_timeout() {
                        "request timed out".to_string()
                    } else {
                        e.to_string()
                    };
                    FetchError::fetch_failed(current.as_str(), reason)
                })?;

            let Some(next) = redirect_target(&current, &response) else {
                return Ok((current, response));
            };

            debug!(hop, from = %current, to = %next, "following redirect");
            current = self.checker.check_url(next).await?;
        }

        Err(FetchError::fetch_failed(
            target.as_str(),
            format!("more than {MAX_REDIRECTS} redirects"),
        ))
    }
}

/// Resolves the `Location` of a redirect response against the current URL.
fn redirect_target(current: &TargetUrl, response: &reqwest::Response) -> Option<url::Url> {
    if !is_followed_redirect(response.status()) {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.as_url().join(location).ok()
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}
