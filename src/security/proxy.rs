//! Trusted-proxy handling: effective host and client IP resolution.
//!
//! # Design Decisions
//! - `X-Forwarded-*` headers are honoured only when the immediate peer is a
//!   trusted proxy (configured CIDR or loopback)
//! - With several proxy hops only the first forwarded value is used
//! - Never trust existing X-Forwarded-* from untrusted sources

use std::net::IpAddr;

use axum::http::{header, HeaderMap};
use ipnet::IpNet;

use crate::config::TrustSettings;

pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Process-wide trust settings, compiled once at startup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct TrustConfig {
    /// Allow-list entries as configured (wildcards already removed).
    pub allowed_origins: Vec<String>,
    /// Allow-list entries reduced to their normalised host.
    allowed_hosts: Vec<String>,
    /// Any non-empty entry was configured, wildcards included.
    origins_configured: bool,
    pub trusted_proxies: Vec<IpNet>,
    pub production: bool,
}

impl TrustConfig {
    pub fn new(allowed_origins: Vec<String>, trusted_proxies: Vec<IpNet>, production: bool) -> Self {
        let configured: Vec<String> = allowed_origins
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let origins_configured = !configured.is_empty();
        let allowed_origins: Vec<String> = configured
            .into_iter()
            .filter(|origin| !origin.contains('*'))
            .collect();
        let allowed_hosts = allowed_origins
            .iter()
            .filter_map(|origin| origin_entry_host(origin))
            .collect();

        Self {
            allowed_origins,
            allowed_hosts,
            origins_configured,
            trusted_proxies,
            production,
        }
    }

    /// Compile raw settings. Entries that fail to parse are skipped with a
    /// warning; validation rejects them before this point in normal startup.
    pub fn from_settings(settings: &TrustSettings) -> Self {
        let proxies = settings
            .trusted_proxy_cidrs
            .iter()
            .filter_map(|raw| {
                let parsed = parse_proxy_cidr(raw);
                if parsed.is_none() {
                    tracing::warn!(cidr = %raw, "Ignoring invalid trusted proxy CIDR");
                }
                parsed
            })
            .collect();

        Self::new(settings.allowed_origins.clone(), proxies, settings.production)
    }

    pub(crate) fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// True when an allow-list was configured, even if every entry was a
    /// wildcard. Such a list matches nothing rather than falling back to
    /// same-origin.
    pub fn restricts_origins(&self) -> bool {
        self.origins_configured
    }

    /// Loopback peers and peers inside a configured CIDR.
    pub fn is_trusted_proxy(&self, peer: IpAddr) -> bool {
        peer.is_loopback() || self.trusted_proxies.iter().any(|net| net.contains(&peer))
    }
}

/// Parse a CIDR, accepting a bare address as a single-host network.
pub fn parse_proxy_cidr(raw: &str) -> Option<IpNet> {
    let raw = raw.trim();
    raw.parse::<IpNet>()
        .ok()
        .or_else(|| {
            let ip = raw.parse::<IpAddr>().ok()?;
            let prefix = if ip.is_ipv4() { 32 } else { 128 };
            IpNet::new(ip, prefix).ok()
        })
}

/// Lower-case a host and strip any port, handling bracketed IPv6 literals.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let stripped = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };
    stripped.to_ascii_lowercase()
}

/// Host of an allow-list entry, which may be a full origin or a bare host.
fn origin_entry_host(entry: &str) -> Option<String> {
    match url::Url::parse(entry) {
        Ok(url) if url.host_str().is_some() => url.host_str().map(normalize_host),
        _ => {
            let host = normalize_host(entry);
            (!host.is_empty()).then_some(host)
        }
    }
}

fn first_value(raw: &str) -> Option<&str> {
    raw.split(',').map(str::trim).find(|v| !v.is_empty())
}

/// The host the client addressed, normalised.
///
/// `X-Forwarded-Host` replaces the declared host only when `peer` is a
/// trusted proxy; otherwise it is ignored even when present.
pub fn effective_host(
    headers: &HeaderMap,
    authority: Option<&str>,
    peer: Option<IpAddr>,
    trust: &TrustConfig,
) -> String {
    if peer.is_some_and(|ip| trust.is_trusted_proxy(ip)) {
        let forwarded = headers
            .get(X_FORWARDED_HOST)
            .and_then(|v| v.to_str().ok())
            .and_then(first_value);
        if let Some(host) = forwarded {
            return normalize_host(host);
        }
    }

    let declared = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or(authority)
        .unwrap_or_default();
    normalize_host(declared)
}

/// The client address used to key per-IP limiters.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trust: &TrustConfig) -> IpAddr {
    if !trust.is_trusted_proxy(peer) {
        return peer;
    }
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(first_value)
        .and_then(|v| v.parse().ok())
        .unwrap_or(peer)
}
