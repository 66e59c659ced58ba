//! Host matching logic.
//!
//! # Responsibilities
//! - Parse configured host patterns (exact, `*.suffix`, `*`)
//! - Extract the routing host from a request (Host header or URI authority)
//! - Split an optional port off a host
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - A trailing dot is ignored (`example.com.` == `example.com`)
//! - No regex to keep matching cheap and predictable

use axum::http::{header, Request};

/// A parsed host pattern from the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostPattern {
    /// Matches one host, optionally including a port (`api.example.com:8080`).
    Exact(String),
    /// `*.example.com`: matches any subdomain of the stored suffix
    /// (stored with its leading dot, `.example.com`).
    Wildcard(String),
    /// `*`: matches every host.
    Any,
}

impl HostPattern {
    /// Parse a configured pattern.
    /// The pattern is normalized to lowercase for case-insensitive matching.
    pub fn parse(pattern: &str) -> Self {
        let normalized = normalize_host(pattern);
        if normalized == "*" {
            HostPattern::Any
        } else if let Some(suffix) = normalized.strip_prefix('*') {
            if suffix.starts_with('.') && suffix.len() > 1 {
                HostPattern::Wildcard(suffix.to_string())
            } else {
                HostPattern::Exact(normalized)
            }
        } else {
            HostPattern::Exact(normalized)
        }
    }

    /// Returns true if the (already normalized) host matches this pattern.
    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Exact(expected) => {
                expected == host || expected == split_host_port(host).0
            }
            HostPattern::Wildcard(suffix) => {
                let name = split_host_port(host).0;
                name.len() > suffix.len() && name.ends_with(suffix.as_str())
            }
            HostPattern::Any => true,
        }
    }
}

impl std::fmt::Display for HostPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostPattern::Exact(host) => f.write_str(host),
            HostPattern::Wildcard(suffix) => write!(f, "*{}", suffix),
            HostPattern::Any => f.write_str("*"),
        }
    }
}

/// Trim, lowercase and drop a trailing dot.
pub fn normalize_host(host: &str) -> String {
    let lowered = host.trim().to_ascii_lowercase();
    let (name, port) = split_host_port(&lowered);
    match (name.strip_suffix('.'), port) {
        (Some(stripped), Some(port)) => format!("{}:{}", stripped, port),
        (Some(stripped), None) => stripped.to_string(),
        (None, _) => lowered,
    }
}

/// Split `host[:port]` into its parts. Bracketed IPv6 literals are kept
/// intact (`[::1]:8080` → (`[::1]`, Some(`8080`))).
pub fn split_host_port(host: &str) -> (&str, Option<&str>) {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => {
                let (name, rest) = host.split_at(end + 1);
                (name, rest.strip_prefix(':'))
            }
            None => (host, None),
        };
    }

    match host.rsplit_once(':') {
        // A second colon means a bare IPv6 literal, not host:port.
        Some((name, port))
            if !name.contains(':') && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (name, Some(port))
        }
        _ => (host, None),
    }
}

/// The normalized host a request is addressed to.
///
/// HTTP/1.1 carries it in the Host header; HTTP/2 carries it in the
/// `:authority` pseudo-header, which surfaces as the URI authority.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .map(normalize_host)
        .filter(|h| !h.is_empty())
}
