//! Destination checks run by callers before a URL is shortened.
//!
//! [`ShortenerService`](crate::ShortenerService) trusts its input. Anything
//! that accepts URLs from outside should pass them through
//! [`validate_destination`] first, which rejects malformed URLs and URLs
//! pointing at loopback or private-network hosts.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tinylink_core::ShortenerError;
use tracing::debug;
use url::{Host, Url};

/// Longest URL accepted for shortening, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// The parts of a URL needed to decide whether its destination is safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub scheme: String,
    /// Lowercased domain, or the textual form of a literal address.
    pub host: String,
    pub port: u16,
    /// Set when the host is a literal IPv4 or IPv6 address.
    pub ip: Option<IpAddr>,
}

/// Validates the URL syntactically and checks that its host is public.
///
/// Literal IP hosts are checked directly; host names are resolved and every
/// returned address must be public.
pub async fn validate_destination(url: &str) -> Result<Destination, ShortenerError> {
    let destination = parse_destination(url)?;

    if let Some(ip) = destination.ip {
        ensure_public(ip)?;
        return Ok(destination);
    }

    let addrs = tokio::net::lookup_host((destination.host.as_str(), destination.port))
        .await
        .map_err(|e| {
            ShortenerError::InvalidUrl(format!("unable to resolve host {}: {e}", destination.host))
        })?;

    let mut resolved = 0usize;
    for addr in addrs {
        ensure_public(addr.ip())?;
        resolved += 1;
    }
    if resolved == 0 {
        return Err(ShortenerError::InvalidUrl(format!(
            "host {} did not resolve to any address",
            destination.host
        )));
    }

    debug!(host = %destination.host, resolved, "destination is public");
    Ok(destination)
}

/// Parses an absolute `http`/`https` URL without touching the network.
///
/// Host extraction follows the WHATWG URL standard, so the host checked here
/// is the one a browser would connect to.
pub fn parse_destination(url: &str) -> Result<Destination, ShortenerError> {
    if url.is_empty() {
        return Err(ShortenerError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL too long ({} bytes, max {})",
            url.len(),
            MAX_URL_LENGTH
        )));
    }

    // The parser silently strips some of these; reject them outright.
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ShortenerError::InvalidUrl(
            "URL must not contain whitespace or control characters".to_string(),
        ));
    }

    let parsed = Url::parse(url)
        .map_err(|e| ShortenerError::InvalidUrl(format!("{url}: {e}")))?;

    let scheme = parsed.scheme().to_string();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            scheme
        )));
    }

    let (host, ip) = match parsed.host() {
        Some(Host::Domain(domain)) => (domain.trim_end_matches('.').to_string(), None),
        Some(Host::Ipv4(ip)) => (ip.to_string(), Some(IpAddr::V4(ip))),
        Some(Host::Ipv6(ip)) => (ip.to_string(), Some(IpAddr::V6(ip))),
        None => {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )))
        }
    };

    if host.is_empty() {
        return Err(ShortenerError::InvalidUrl(format!(
            "URL must have a valid scheme and host: {}",
            url
        )));
    }
    if host == "localhost" || host.ends_with(".localhost") {
        return Err(ShortenerError::InvalidUrl(
            "localhost is not allowed".to_string(),
        ));
    }

    let port = parsed.port_or_known_default().ok_or_else(|| {
        ShortenerError::InvalidUrl(format!("URL has no usable port: {}", url))
    })?;

    Ok(Destination {
        scheme,
        host,
        port,
        ip,
    })
}

fn ensure_public(ip: IpAddr) -> Result<(), ShortenerError> {
    if is_private_ip(&ip) {
        return Err(ShortenerError::InvalidUrl(format!(
            "destination address {} is not public",
            ip
        )));
    }
    Ok(())
}

/// Returns `true` for loopback, private, link-local and otherwise
/// non-routable addresses.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_private_ipv4(*ipv4),
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ipv4(mapped);
            }
            ipv6.is_loopback()                   // ::1
                || ipv6.is_unspecified()          // ::
                || ipv6.is_multicast()            // ff00::/8
                || is_ipv6_link_local(*ipv6)      // fe80::/10
                || is_ipv6_unique_local(*ipv6) // fc00::/7
        }
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()                // 127.0.0.0/8
        || ip.is_unspecified()      // 0.0.0.0
        || ip.is_broadcast()        // 255.255.255.255
        || ip.is_link_local()       // 169.254.0.0/16
        || ip.is_private()          // 10/8, 172.16/12, 192.168/16
        || ip.is_multicast()        // 224.0.0.0/4
        || is_ipv4_cgnat(ip) // 100.64.0.0/10
}

fn is_ipv4_cgnat(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    a == 100 && (b & 0xC0) == 64
}

fn is_ipv6_link_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xFFC0) == 0xFE80
}

fn is_ipv6_unique_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xFE00) == 0xFC00
}
