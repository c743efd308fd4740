//! Guarded remote fetch: SSRF-checked probing and size-bounded streaming.
//!
//! # Pipeline
//!
//! 1. [`AddressChecker`] validates scheme and resolves the host; any private,
//!    loopback, or link-local address blocks the request ([`TargetUrl`] is
//!    the proof of a passed check).
//! 2. [`GuardedClient::probe`] learns type/length/range support through a
//!    `HEAD`, falling back to a one-byte ranged `GET`.
//! 3. [`GuardedClient::open_download`] refuses known-oversized resources up
//!    front, then hands back a [`BoundedStream`] that aborts mid-transfer once
//!    the ceiling would be crossed.
//!
//! All state is request-scoped. Redirects are followed manually and every hop
//! is re-checked.
//!
//! # Example
//!
//! ```no_run
//! use downloader_api::fetch::{AddressChecker, GuardedClient, TransferLimits};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GuardedClient::new(AddressChecker::system())?;
//! let target = client.validate("https://example.com/file.bin").await?;
//! let probe = client.probe(&target).await?;
//! println!("{} bytes of {}", probe.content_length.unwrap_or(0), probe.content_type);
//!
//! let download = client.open_download(&target, None, TransferLimits::default()).await?;
//! println!("streaming {}", download.filename);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;
mod guard;
mod probe;
mod proxy;

pub use client::GuardedClient;
pub use constants::DEFAULT_MAX_BYTES;
pub use error::FetchError;
pub use filename::content_disposition;
pub use guard::{
    AddressChecker, HostResolver, StaticResolver, SystemResolver, TargetUrl, is_private_ip,
    is_private_ipv4, is_private_ipv6,
};
pub use probe::ProbeResult;
pub use proxy::{BoundedStream, DownloadBody, StreamedDownload, TransferLimits};
