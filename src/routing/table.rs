//! Routing table construction.
//!
//! Turns the raw `proxies` mapping into validated [`RoutingEntry`] values.
//! Nothing here is fatal: malformed or disabled entries are skipped with a
//! warning and recorded in [`RoutingTable::skipped`].

use std::fmt;

use url::Url;

use crate::config::ProxyTarget;
use crate::routing::matcher::HostPattern;

/// Scheme used to reach a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendScheme {
    Http,
    Https,
}

impl BackendScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendScheme::Http => "http",
            BackendScheme::Https => "https",
        }
    }
}

impl fmt::Display for BackendScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated host → backend mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    pub host_pattern: HostPattern,
    pub backend_scheme: BackendScheme,
    /// `host:port`, always with an explicit port.
    pub backend_authority: String,
    /// Skip certificate verification towards this backend.
    pub skip_verify: bool,
}

impl RoutingEntry {
    /// Backend base URL, e.g. `http://127.0.0.1:9001`.
    pub fn backend_url(&self) -> String {
        format!("{}://{}", self.backend_scheme, self.backend_authority)
    }
}

/// Why an entry did not make it into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Key starts with `#`.
    Comment,
    /// Key is empty after trimming.
    EmptyHost,
    /// Target is not a string or `{ "target": ... }` object.
    NotAUrl,
    /// Target failed URL parsing.
    InvalidUrl(String),
    /// Scheme is neither http nor https.
    UnsupportedScheme(String),
    /// Target URL has no host.
    MissingHost,
    /// Target is https but the HTTPS listener is disabled.
    HttpsDisabled,
    /// A later entry with the same host pattern replaced this one.
    Superseded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Comment => f.write_str("comment"),
            SkipReason::EmptyHost => f.write_str("empty host"),
            SkipReason::NotAUrl => f.write_str("target is not a URL string"),
            SkipReason::InvalidUrl(e) => write!(f, "invalid target URL: {}", e),
            SkipReason::UnsupportedScheme(s) => write!(f, "unsupported scheme {:?}", s),
            SkipReason::MissingHost => f.write_str("target URL has no host"),
            SkipReason::HttpsDisabled => f.write_str(
                "https scheme detected but server is not enabled, run with --https-enabled",
            ),
            SkipReason::Superseded => f.write_str("superseded by a later entry for the same host"),
        }
    }
}

/// An entry left out of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub host: String,
    pub reason: SkipReason,
}

/// Immutable set of routing entries, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
    skipped: Vec<SkippedEntry>,
}

impl RoutingTable {
    /// Build a table from the raw `proxies` mapping, in order.
    ///
    /// Duplicate host patterns resolve last-wins; the earlier entry is
    /// reported as [`SkipReason::Superseded`].
    pub fn build<I, K>(proxies: I, https_enabled: bool) -> Self
    where
        I: IntoIterator<Item = (K, ProxyTarget)>,
        K: AsRef<str>,
    {
        let mut table = RoutingTable::default();

        for (host, target) in proxies {
            let host = host.as_ref();
            match parse_entry(host, &target, https_enabled) {
                Ok(entry) => table.insert(host, entry),
                Err(SkipReason::Comment) => {
                    tracing::debug!(host = %host, "Skipping commented-out proxy");
                    table.skip(host, SkipReason::Comment);
                }
                Err(reason) => {
                    tracing::warn!(host = %host, reason = %reason, "Skipping proxy entry");
                    table.skip(host, reason);
                }
            }
        }

        table
    }

    fn insert(&mut self, host: &str, entry: RoutingEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.host_pattern == entry.host_pattern)
        {
            tracing::warn!(
                host = %host,
                previous = %existing.backend_url(),
                backend = %entry.backend_url(),
                "Duplicate host, last entry wins"
            );
            let pattern = existing.host_pattern.to_string();
            *existing = entry;
            self.skip(&pattern, SkipReason::Superseded);
        } else {
            self.entries.push(entry);
        }
    }

    fn skip(&mut self, host: &str, reason: SkipReason) {
        self.skipped.push(SkippedEntry {
            host: host.to_string(),
            reason,
        });
    }

    /// Accepted entries, in first-registration order.
    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    /// Entries that were left out, with the reason.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry needs the non-verifying TLS client.
    pub fn needs_insecure_client(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.skip_verify && e.backend_scheme == BackendScheme::Https)
    }
}

fn parse_entry(
    host: &str,
    target: &ProxyTarget,
    https_enabled: bool,
) -> Result<RoutingEntry, SkipReason> {
    let host = host.trim();
    if host.starts_with('#') {
        return Err(SkipReason::Comment);
    }
    if host.is_empty() {
        return Err(SkipReason::EmptyHost);
    }

    let (raw_url, skip_verify) = match target {
        ProxyTarget::Url(url) => (url.as_str(), false),
        ProxyTarget::Detailed {
            target,
            insecure_skip_verify,
        } => (target.as_str(), *insecure_skip_verify),
        ProxyTarget::Unsupported(_) => return Err(SkipReason::NotAUrl),
    };

    let url = Url::parse(raw_url.trim()).map_err(|e| SkipReason::InvalidUrl(e.to_string()))?;

    let backend_scheme = match url.scheme() {
        "http" => BackendScheme::Http,
        "https" => BackendScheme::Https,
        other => return Err(SkipReason::UnsupportedScheme(other.to_string())),
    };

    let backend_host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(SkipReason::MissingHost)?;

    if backend_scheme == BackendScheme::Https && !https_enabled {
        return Err(SkipReason::HttpsDisabled);
    }

    // Both schemes have a known default, so this is always Some.
    let port = url.port_or_known_default().ok_or(SkipReason::MissingHost)?;

    if url.path() != "/" || url.query().is_some() {
        tracing::debug!(
            host = %host,
            target = %raw_url,
            "Target path and query are ignored; requests keep their own"
        );
    }

    Ok(RoutingEntry {
        host_pattern: HostPattern::parse(host),
        backend_scheme,
        backend_authority: format!("{}:{}", backend_host, port),
        skip_verify,
    })
}
