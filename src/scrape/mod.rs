//! Page inspection through the guarded client.
//!
//! [`PageInspector::inspect`] fetches a public page with browser-like
//! headers and summarizes it: JSON bodies are passed through, HTML pages
//! are reduced to title, description, and media-like links. The target and
//! every redirect hop go through the same address checks as downloads.

mod error;
pub mod extract;
mod retry;

pub use error::ScrapeError;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};

use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::Method;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::fetch::constants::TRANSFER_OPEN_TIMEOUT;
use crate::fetch::{BoundedStream, GuardedClient, TargetUrl, TransferLimits};
use crate::user_agent::BROWSER_USER_AGENT;

/// Timeout for one complete page fetch, body included.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(8);

/// Largest page body read (2 MiB).
pub const MAX_PAGE_BYTES: u64 = 2 * 1024 * 1024;

/// Host fragments of converter sites that cannot be scraped.
const CONVERTER_HOSTS: [&str; 3] = ["ytmp3", "ytmp4", "y2mate"];

/// Summary of an inspected page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageSummary {
    /// Upstream answered with JSON.
    Json {
        /// Parsed payload, or `{"raw": text}` when it did not parse.
        data: Value,
    },
    /// Upstream answered with anything else, read as HTML.
    Html {
        title: String,
        description: String,
        links: Vec<String>,
        #[serde(rename = "totalLinks")]
        total_links: usize,
    },
}

/// A fetched page before summarizing.
#[derive(Debug)]
struct FetchedPage {
    target: TargetUrl,
    content_type: String,
    body: Vec<u8>,
}

/// Fetches and summarizes pages.
#[derive(Debug, Clone)]
pub struct PageInspector {
    client: GuardedClient,
    policy: RetryPolicy,
    timeout: Duration,
    max_bytes: u64,
}

impl PageInspector {
    #[must_use]
    pub fn new(client: GuardedClient) -> Self {
        Self {
            client,
            policy: RetryPolicy::page_fetch(),
            timeout: PAGE_TIMEOUT,
            max_bytes: MAX_PAGE_BYTES,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Validates `input`, fetches it (retrying timeouts per policy), and summarizes it.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Fetch`] for validation, transport, or size failures
    /// - [`ScrapeError::ConverterSite`] for known converter hosts
    /// - [`ScrapeError::Timeout`] when every attempt timed out
    /// - [`ScrapeError::HttpStatus`] for non-success answers
    #[instrument(skip(self))]
    pub async fn inspect(&self, input: &str) -> Result<PageSummary, ScrapeError> {
        let target = self.client.validate(input).await?;
        if let Some(host) = target.as_url().host_str()
            && CONVERTER_HOSTS.iter().any(|marker| host.contains(marker))
        {
            return Err(ScrapeError::ConverterSite {
                host: host.to_string(),
            });
        }

        let mut attempt = 1;
        let page = loop {
            match self.fetch_with_timeout(&target).await {
                Ok(page) => break page,
                Err(error) => match self.policy.should_retry(classify_error(&error), attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next,
                    } => {
                        warn!(%error, attempt = next, "retrying page fetch");
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(%error, reason, "giving up on page fetch");
                        return Err(error);
                    }
                },
            }
        };

        info!(url = %page.target, bytes = page.body.len(), "page fetched");
        Ok(summarize(&page))
    }

    async fn fetch_with_timeout(&self, target: &TargetUrl) -> Result<FetchedPage, ScrapeError> {
        tokio::time::timeout(self.timeout, self.fetch_once(target))
            .await
            .unwrap_or_else(|_| {
                Err(ScrapeError::Timeout {
                    url: target.as_str().to_string(),
                    after: self.timeout,
                })
            })
    }

    async fn fetch_once(&self, target: &TargetUrl) -> Result<FetchedPage, ScrapeError> {
        let headers = browser_headers(target);
        let (final_url, response) = self
            .client
            .send_with_headers(Method::GET, target, &headers, TRANSFER_OPEN_TIMEOUT)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: final_url.as_str().to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let limits = TransferLimits {
            max_bytes: self.max_bytes,
            idle_timeout: None,
        };
        let mut stream = BoundedStream::new(response.bytes_stream().boxed(), limits);
        let mut body = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }

        Ok(FetchedPage {
            target: final_url,
            content_type,
            body: body.to_vec(),
        })
    }
}

fn browser_headers(target: &TargetUrl) -> HeaderMap {
    let referer = if target.as_str().contains("youtube") {
        "https://www.youtube.com/"
    } else {
        "https://www.google.com/"
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(REFERER, HeaderValue::from_static(referer));
    headers
}

fn summarize(page: &FetchedPage) -> PageSummary {
    let text = String::from_utf8_lossy(&page.body);

    if page.content_type.contains("application/json") {
        let data = serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": text }));
        return PageSummary::Json { data };
    }

    let links = extract::extract_media_links(&text, page.target.as_url());
    PageSummary::Html {
        title: extract::extract_title(&text),
        description: extract::extract_description(&text),
        total_links: links.len(),
        links,
    }
}
