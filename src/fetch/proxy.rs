//! Size-bounded streaming of a remote body to the caller.
//!
//! [`BoundedStream`] wraps an upstream byte stream and owns the transfer
//! budget for exactly one download. The chunk that would push the running
//! total past the ceiling is never forwarded: the stream yields
//! [`FetchError::TooLarge`], drops the upstream (closing its connection),
//! and ends. Dropping the `BoundedStream` itself, which happens when the
//! caller disconnects, cancels the upstream read the same way.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use reqwest::Method;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::time::{Instant, Sleep};
use tracing::{debug, info, instrument, warn};

use super::client::GuardedClient;
use super::constants::{
    DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_BYTES, FALLBACK_CONTENT_TYPE, TRANSFER_OPEN_TIMEOUT,
};
use super::error::FetchError;
use super::filename::attachment_filename;
use super::guard::TargetUrl;
use super::probe::content_length;

/// Limits applied to one proxied transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    /// Maximum bytes forwarded to the caller.
    pub max_bytes: u64,
    /// Longest allowed gap between two body chunks; `None` disables the check.
    pub idle_timeout: Option<Duration>,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

/// Upstream body type carried by [`StreamedDownload`].
pub type DownloadBody = BoundedStream<BoxStream<'static, reqwest::Result<Bytes>>>;

/// An opened download, ready to be framed as a response.
#[derive(Debug)]
pub struct StreamedDownload {
    /// Upstream content type, or `application/octet-stream`.
    pub content_type: String,
    /// Upstream `Content-Length` when sent.
    pub content_length: Option<u64>,
    /// Attachment filename (not yet header-encoded).
    pub filename: String,
    /// The size-bounded body.
    pub body: DownloadBody,
}

impl GuardedClient {
    /// Opens a size-bounded download of `target`.
    ///
    /// A `HEAD` is sent first; when it reports a length above
    /// `limits.max_bytes` the transfer is refused without opening the `GET`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::TooLarge`] when the advertised size exceeds the ceiling
    /// - [`FetchError::UpstreamUnavailable`] on a non-success `GET` status
    /// - [`FetchError::FetchFailed`] if the `GET` cannot be opened in time
    #[instrument(skip(self, target, limits), fields(url = %target, max_bytes = limits.max_bytes))]
    pub async fn open_download(
        &self,
        target: &TargetUrl,
        filename_hint: Option<&str>,
        limits: TransferLimits,
    ) -> Result<StreamedDownload, FetchError> {
        if let Some(length) = self.head_length(target).await
            && length > limits.max_bytes
        {
            info!(length, "refusing download above size limit");
            return Err(FetchError::too_large(limits.max_bytes));
        }

        let (final_url, response) = self
            .send(Method::GET, target, None, TRANSFER_OPEN_TIMEOUT)
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "upstream refused download");
            return Err(FetchError::upstream_unavailable(
                final_url.as_str(),
                status.as_u16(),
            ));
        }

        let advertised = content_length(response.headers());
        if advertised.is_some_and(|length| length > limits.max_bytes) {
            info!(?advertised, "upstream advertised size above limit");
            return Err(FetchError::too_large(limits.max_bytes));
        }
        // Only a real Content-Length is forwarded; vendor size headers may be stale.
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let filename = attachment_filename(filename_hint, target.as_url());

        debug!(%content_type, ?content_length, %filename, "download opened");

        Ok(StreamedDownload {
            content_type,
            content_length,
            filename,
            body: BoundedStream::new(response.bytes_stream().boxed(), limits),
        })
    }
}

/// Byte stream that aborts once more than `max_bytes` would be forwarded.
pub struct BoundedStream<S> {
    inner: Option<S>,
    sent: u64,
    max_bytes: u64,
    idle_timeout: Option<Duration>,
    idle: Option<Pin<Box<Sleep>>>,
}

impl<S> std::fmt::Debug for BoundedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedStream")
            .field("sent", &self.sent)
            .field("max_bytes", &self.max_bytes)
            .field("open", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> BoundedStream<S> {
    /// Wraps `inner` with the given limits.
    pub fn new(inner: S, limits: TransferLimits) -> Self {
        Self {
            inner: Some(inner),
            sent: 0,
            max_bytes: limits.max_bytes,
            idle_timeout: limits.idle_timeout,
            idle: limits
                .idle_timeout
                .map(|timeout| Box::pin(tokio::time::sleep(timeout))),
        }
    }

    /// Bytes forwarded so far.
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    fn close(&mut self) {
        self.inner = None;
        self.idle = None;
    }
}

impl<S, E> Stream for BoundedStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<Bytes, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                let total = this.sent.saturating_add(chunk.len() as u64);
                if total > this.max_bytes {
                    warn!(
                        sent = this.sent,
                        max_bytes = this.max_bytes,
                        "size limit reached mid-stream, aborting transfer"
                    );
                    this.close();
                    return Poll::Ready(Some(Err(FetchError::too_large(this.max_bytes))));
                }
                this.sent = total;
                if let (Some(idle), Some(timeout)) = (this.idle.as_mut(), this.idle_timeout) {
                    idle.as_mut().reset(Instant::now() + timeout);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.close();
                Poll::Ready(Some(Err(FetchError::stream(e))))
            }
            Poll::Ready(None) => {
                debug!(sent = this.sent, "upstream body complete");
                this.close();
                Poll::Ready(None)
            }
            Poll::Pending => {
                if let Some(idle) = this.idle.as_mut()
                    && idle.as_mut().poll(cx).is_ready()
                {
                    let idle = this.idle_timeout.unwrap_or_default();
                    warn!(sent = this.sent, ?idle, "upstream stalled, aborting transfer");
                    this.close();
                    return Poll::Ready(Some(Err(FetchError::IdleTimeout { idle })));
                }
                Poll::Pending
            }
        }
    }
}
