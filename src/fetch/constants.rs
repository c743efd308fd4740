//! Constants for the guarded fetch pipeline (timeouts, ceilings, redirects).

use std::time::Duration;

/// Default byte ceiling for one proxied download (100 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;

/// Timeout for the HEAD probe and its ranged GET fallback.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for opening the proxied GET (until response headers arrive).
pub const TRANSFER_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default idle timeout between two body chunks of a proxied download.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// TCP connect timeout for the shared outbound client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum redirect hops followed (each one re-validated).
pub const MAX_REDIRECTS: usize = 5;

/// Content type reported when upstream does not send one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Vendor header some file hosts use instead of `Content-Length`.
pub const X_FILE_SIZE: &str = "x-file-size";
