//! Origin / Referer validation for state-changing requests.
//!
//! # Responsibilities
//! - Match an Origin (or Referer-derived origin) against the allow-list
//! - Fall back to same-origin with the effective host when no allow-list is set
//! - Fail closed in production when the allow-list is empty
//!
//! # Design Decisions
//! - Wildcard allow-list entries are never honoured
//! - Requests without Origin and Referer pass, so non-browser clients work
//! - Safe methods (GET, HEAD, OPTIONS, TRACE) always pass

use std::net::IpAddr;

use axum::http::{header, HeaderMap, Method};
use url::Url;

use crate::security::proxy::{effective_host, normalize_host, TrustConfig};

/// Why a request's origin was rejected. Used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginRejection {
    /// Production mode with no allow-list configured.
    Unconfigured,
    /// The origin did not match the allow-list or the effective host.
    Mismatch,
}

impl OriginRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginRejection::Unconfigured => "unconfigured",
            OriginRejection::Mismatch => "mismatch",
        }
    }
}

/// Methods that never change state and skip origin validation.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Check one Origin value against the trust settings.
///
/// With a configured allow-list the raw value or its host must match an
/// entry. With no list the origin's host must equal `effective_host`.
pub fn is_origin_allowed(origin: &str, trust: &TrustConfig, effective_host: &str) -> bool {
    let origin = origin.trim();
    let host = Url::parse(origin)
        .ok()
        .and_then(|url| url.host_str().map(normalize_host));

    if trust.restricts_origins() {
        if trust
            .allowed_origins
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(origin))
        {
            return true;
        }
        return host.is_some_and(|host| trust.allowed_hosts().iter().any(|allowed| *allowed == host));
    }

    host.is_some_and(|host| !host.is_empty() && host == effective_host)
}

/// `scheme://host[:port]` of a Referer value.
fn referer_origin(referer: &str) -> Option<String> {
    let url = Url::parse(referer.trim()).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Validate a request's declared origin.
///
/// `authority` is the request URI authority (HTTP/2) and `peer` the
/// immediate peer address, both used to resolve the effective host.
pub fn validate_request(
    method: &Method,
    headers: &HeaderMap,
    authority: Option<&str>,
    peer: Option<IpAddr>,
    trust: &TrustConfig,
) -> Result<(), OriginRejection> {
    if is_safe_method(method) {
        return Ok(());
    }

    if trust.production && trust.allowed_origins.is_empty() {
        return Err(OriginRejection::Unconfigured);
    }

    let origin = match headers.get(header::ORIGIN) {
        Some(value) => Some(value.to_str().map(str::to_string).map_err(|_| OriginRejection::Mismatch)?),
        None => match headers.get(header::REFERER) {
            Some(value) => {
                let referer = value.to_str().map_err(|_| OriginRejection::Mismatch)?;
                Some(referer_origin(referer).ok_or(OriginRejection::Mismatch)?)
            }
            None => None,
        },
    };

    let Some(origin) = origin else {
        return Ok(());
    };

    let host = effective_host(headers, authority, peer, trust);
    if is_origin_allowed(&origin, trust, &host) {
        Ok(())
    } else {
        Err(OriginRejection::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn open() -> TrustConfig {
        TrustConfig::new(vec![], vec![], false)
    }

    fn listed() -> TrustConfig {
        TrustConfig::new(
            vec!["https://console.example.com".into(), "Ops.Example.org:8443".into()],
            vec![],
            false,
        )
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn same_origin_fallback() {
        let trust = open();
        assert!(is_origin_allowed("https://app.example.com", &trust, "app.example.com"));
        assert!(is_origin_allowed("http://APP.example.com:3000", &trust, "app.example.com"));
        assert!(!is_origin_allowed("https://evil.example", &trust, "app.example.com"));
        assert!(!is_origin_allowed("null", &trust, "app.example.com"));
    }

    #[test]
    fn allow_list_ignores_effective_host() {
        let trust = listed();
        assert!(is_origin_allowed("https://console.example.com", &trust, "app.example.com"));
        assert!(is_origin_allowed("HTTPS://CONSOLE.EXAMPLE.COM", &trust, "whatever"));
        assert!(is_origin_allowed("https://ops.example.org", &trust, "whatever"));
        assert!(!is_origin_allowed("https://app.example.com", &trust, "app.example.com"));
    }

    #[test]
    fn wildcard_entry_matches_nothing() {
        let trust = TrustConfig::new(vec!["*".into()], vec![], false);
        assert!(!is_origin_allowed("https://evil.example", &trust, "app.example.com"));
        // A wildcard-only list must not fall back to same-origin trust.
        assert!(!is_origin_allowed("https://app.example.com", &trust, "app.example.com"));

        let h = headers(&[("origin", "https://app.example.com"), ("host", "app.example.com")]);
        assert_eq!(
            validate_request(&Method::POST, &h, None, None, &trust),
            Err(OriginRejection::Mismatch)
        );
    }

    #[test]
    fn safe_methods_always_pass() {
        let trust = TrustConfig::new(vec![], vec![], true);
        let h = headers(&[("origin", "https://evil.example")]);
        for method in [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE] {
            assert_eq!(validate_request(&method, &h, None, None, &trust), Ok(()));
        }
    }

    #[test]
    fn referer_used_when_origin_absent() {
        let trust = open();
        let good = headers(&[("host", "app.example.com"), ("referer", "https://app.example.com/ns/dev?x=1")]);
        let bad = headers(&[("host", "app.example.com"), ("referer", "https://evil.example/page")]);
        assert_eq!(validate_request(&Method::POST, &good, None, None, &trust), Ok(()));
        assert_eq!(
            validate_request(&Method::POST, &bad, None, None, &trust),
            Err(OriginRejection::Mismatch)
        );
    }

    #[test]
    fn origin_preferred_over_referer() {
        let trust = open();
        let h = headers(&[
            ("host", "app.example.com"),
            ("origin", "https://evil.example"),
            ("referer", "https://app.example.com/"),
        ]);
        assert_eq!(
            validate_request(&Method::DELETE, &h, None, None, &trust),
            Err(OriginRejection::Mismatch)
        );
    }

    #[test]
    fn headerless_request_passes_outside_production() {
        let h = headers(&[("host", "app.example.com")]);
        assert_eq!(validate_request(&Method::POST, &h, None, None, &open()), Ok(()));
    }

    #[test]
    fn production_without_allow_list_fails_closed() {
        let trust = TrustConfig::new(vec![], vec![], true);
        let same = headers(&[("host", "app.example.com"), ("origin", "https://app.example.com")]);
        let none = headers(&[("host", "app.example.com")]);
        assert_eq!(
            validate_request(&Method::POST, &same, None, None, &trust),
            Err(OriginRejection::Unconfigured)
        );
        assert_eq!(
            validate_request(&Method::PUT, &none, None, None, &trust),
            Err(OriginRejection::Unconfigured)
        );
    }

    #[test]
    fn production_with_allow_list_enforces_it() {
        let trust = TrustConfig::new(vec!["https://console.example.com".into()], vec![], true);
        let good = headers(&[("origin", "https://console.example.com")]);
        let bad = headers(&[("origin", "https://evil.example")]);
        let none = HeaderMap::new();
        assert_eq!(validate_request(&Method::POST, &good, None, None, &trust), Ok(()));
        assert!(validate_request(&Method::POST, &bad, None, None, &trust).is_err());
        assert_eq!(validate_request(&Method::POST, &none, None, None, &trust), Ok(()));
    }

    #[test]
    fn forwarded_host_from_untrusted_peer_cannot_spoof_same_origin() {
        let trust = TrustConfig::new(vec![], vec!["10.0.0.0/8".parse().unwrap()], false);
        let h = headers(&[
            ("host", "app.example.com"),
            ("x-forwarded-host", "evil.example"),
            ("origin", "https://evil.example"),
        ]);
        let outsider = "203.0.113.1".parse().ok();
        let proxy = "10.0.0.5".parse().ok();
        assert!(validate_request(&Method::POST, &h, None, outsider, &trust).is_err());
        assert_eq!(validate_request(&Method::POST, &h, None, proxy, &trust), Ok(()));
    }
}
