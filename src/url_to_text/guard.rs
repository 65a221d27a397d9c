//! Address policy applied to every URL before it is fetched.

use async_trait::async_trait;
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use crate::config::FetchConfig;
use crate::error::{BoxError, IntakeError};

/// Resolves a host name to the addresses a request would connect to.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, BoxError>;
}

/// DNS resolution through the operating system.
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, BoxError> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// Rejects URLs that are too long, not http(s), or that point at internal addresses.
pub struct UrlGuard {
    max_url_length: usize,
    allow_private_networks: bool,
}

impl UrlGuard {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            max_url_length: config.max_url_length,
            allow_private_networks: config.allow_private_networks,
        }
    }

    /// Checks that need no network access: length, scheme, host shape, literal IPs.
    pub fn check_syntax(&self, raw: &str) -> Result<Url, IntakeError> {
        let raw = raw.trim();
        if raw.len() > self.max_url_length {
            return Err(IntakeError::InvalidSource(format!(
                "URL is longer than {} characters",
                self.max_url_length
            )));
        }

        let url = Url::parse(raw)
            .map_err(|e| IntakeError::InvalidSource(format!("not a valid URL: {e}")))?;
        check_url_shape(&url, self.allow_private_networks)?;
        Ok(url)
    }

    /// Full check, including that no resolved address is internal.
    pub async fn check(&self, raw: &str, resolver: &dyn HostResolver) -> Result<Url, IntakeError> {
        let url = self.check_syntax(raw)?;
        if self.allow_private_networks {
            return Ok(url);
        }

        if let Some(Host::Domain(domain)) = url.host() {
            let port = url.port_or_known_default().unwrap_or(443);
            let addrs = resolver.resolve(domain, port).await.map_err(|e| {
                warn!("Could not resolve {}: {}", domain, e);
                IntakeError::InvalidSource(format!("host {domain} could not be resolved"))
            })?;
            if addrs.is_empty() {
                return Err(IntakeError::InvalidSource(format!(
                    "host {domain} has no addresses"
                )));
            }
            if let Some(addr) = addrs.iter().find(|a| !is_public_address(a)) {
                return Err(IntakeError::InvalidSource(format!(
                    "host {domain} resolves to non-public address {addr}"
                )));
            }
            debug!("{} resolved to {:?}", domain, addrs);
        }

        Ok(url)
    }
}

/// Scheme, host presence, `localhost` names and literal addresses.
///
/// Also used by the fetcher's redirect policy, which cannot resolve names.
pub(crate) fn check_url_shape(url: &Url, allow_private_networks: bool) -> Result<(), IntakeError> {
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(IntakeError::InvalidSource(format!(
                "scheme '{other}' is not allowed"
            )))
        }
    }

    let host = url
        .host()
        .ok_or_else(|| IntakeError::InvalidSource("URL has no host".to_string()))?;
    if allow_private_networks {
        return Ok(());
    }

    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return Err(IntakeError::InvalidSource(
                    "localhost is not allowed".to_string(),
                ));
            }
        }
        Host::Ipv4(ip) => {
            if !is_public_address(&IpAddr::V4(ip)) {
                return Err(IntakeError::InvalidSource(format!(
                    "address {ip} is not public"
                )));
            }
        }
        Host::Ipv6(ip) => {
            if !is_public_address(&IpAddr::V6(ip)) {
                return Err(IntakeError::InvalidSource(format!(
                    "address {ip} is not public"
                )));
            }
        }
    }

    Ok(())
}

pub fn is_public_address(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        // 0.0.0.0/8
        || a == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..=127).contains(&b))
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b == 18 || b == 19))
        // 240.0.0.0/4 reserved
        || a >= 240)
}

fn is_public_v6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(&v4);
    }
    let first = ip.segments()[0];
    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        // 2001:db8::/32 documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8))
}
