//! Address safety checking for user-supplied URLs.
//!
//! [`AddressChecker`] is the only way to obtain a [`TargetUrl`]. It enforces
//! the `http`/`https` scheme allowlist, resolves the host once, and rejects
//! the URL if *any* resolved address is private, loopback, link-local, or
//! unspecified. The check is advisory against DNS-based SSRF: the client may
//! resolve again when it connects, so a rebinding resolver can still race it.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use url::{Host, Url};

use super::error::FetchError;

/// A URL that passed the address safety check.
///
/// There is no public constructor; values only come out of
/// [`AddressChecker::check`] and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    url: Url,
}

impl TargetUrl {
    fn checked(url: Url) -> Self {
        Self { url }
    }

    /// Borrow the validated URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// The validated URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Hostname resolution seam used by the checker.
#[async_trait]
pub trait HostResolver: Send + Sync + fmt::Debug {
    /// Resolves `host` (a domain or bare IP literal) to every address it maps to.
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo` via tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolver that answers every lookup with a fixed address list.
///
/// Useful for pinning hosts in tests or split-horizon deployments.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    addrs: Vec<IpAddr>,
}

impl StaticResolver {
    /// Creates a resolver that always returns `addrs`.
    #[must_use]
    pub fn new(addrs: Vec<IpAddr>) -> Self {
        Self { addrs }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, _host: &str, _port: u16) -> std::io::Result<Vec<IpAddr>> {
        Ok(self.addrs.clone())
    }
}

/// Validates URLs and blocks any that resolve to non-public addresses.
#[derive(Debug, Clone)]
pub struct AddressChecker {
    resolver: Arc<dyn HostResolver>,
}

impl Default for AddressChecker {
    fn default() -> Self {
        Self::system()
    }
}

impl AddressChecker {
    /// Creates a checker using the given resolver.
    #[must_use]
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self { resolver }
    }

    /// Creates a checker using the system resolver.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemResolver))
    }

    /// Parses and validates a candidate URL string.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if the input is not an absolute URL with a host
    /// - [`FetchError::UnsupportedScheme`] for anything but `http`/`https` (no DNS lookup is made)
    /// - [`FetchError::FetchFailed`] if the host cannot be resolved
    /// - [`FetchError::SsrfBlocked`] if any resolved address is non-public
    #[instrument(skip(self), fields(url = %input))]
    pub async fn check(&self, input: &str) -> Result<TargetUrl, FetchError> {
        let url = Url::parse(input.trim()).map_err(|_| FetchError::invalid_url(input))?;
        self.check_url(url).await
    }

    /// Validates an already-parsed URL (used for redirect hops).
    ///
    /// # Errors
    ///
    /// Same as [`check`](Self::check).
    pub async fn check_url(&self, url: Url) -> Result<TargetUrl, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::unsupported_scheme(url.scheme()));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(FetchError::invalid_url(url.as_str())),
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let addrs = self.resolver.resolve(&host, port).await.map_err(|e| {
            debug!(host = %host, error = %e, "host resolution failed");
            FetchError::fetch_failed(url.as_str(), format!("cannot resolve host: {e}"))
        })?;

        if addrs.is_empty() {
            return Err(FetchError::fetch_failed(
                url.as_str(),
                "host resolved to no addresses",
            ));
        }

        if let Some(addr) = addrs.iter().copied().find(|addr| is_private_ip(*addr)) {
            warn!(host = %host, addr = %addr, "blocked request to non-public address");
            return Err(FetchError::ssrf_blocked(host, addr));
        }

        debug!(host = %host, addrs = addrs.len(), "host passed address check");
        Ok(TargetUrl::checked(url))
    }
}

/// Returns true if `addr` must never be fetched on a caller's behalf.
#[must_use]
pub fn is_private_ip(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => is_private_ipv6(v6),
    }
}

/// 10/8, 172.16/12, 192.168/16, 127/8, 169.254/16 and 0/8.
#[must_use]
pub fn is_private_ipv4(addr: Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback() || addr.is_link_local() || addr.octets()[0] == 0
}

/// `::1`, `::`, fc00::/7, fe80::/10, and blocked IPv4 addresses carried in
/// IPv6 form (`::ffff:a.b.c.d`, `::a.b.c.d`, NAT64 `64:ff9b::a.b.c.d`).
#[must_use]
pub fn is_private_ipv6(addr: Ipv6Addr) -> bool {
    if addr.is_loopback() || addr.is_unspecified() {
        return true;
    }
    if let Some(v4) = embedded_ipv4(addr) {
        return is_private_ipv4(v4);
    }
    let first = addr.segments()[0];
    first & 0xfe00 == 0xfc00 || first & 0xffc0 == 0xfe80
}

/// IPv4 address inside a mapped, compatible, or well-known NAT64 IPv6 address.
fn embedded_ipv4(addr: Ipv6Addr) -> Option<Ipv4Addr> {
    let segments = addr.segments();
    if segments[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        let [.., a, b, c, d] = addr.octets();
        return Some(Ipv4Addr::new(a, b, c, d));
    }
    // Covers both `::ffff:0:0/96` and the deprecated `::/96` compatible form.
    addr.to_ipv4()
}
