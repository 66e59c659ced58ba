//! Configuration schema definitions.
//!
//! The configuration document carries the `proxies` mapping plus optional
//! tuning tables. Listener settings come from the command line and are
//! described by [`ListenerConfig`].

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration document for the gateway.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProxyConfig {
    /// Inbound host → backend target, in document order.
    #[serde(deserialize_with = "ordered_proxies")]
    pub proxies: Vec<(String, ProxyTarget)>,

    /// Timeout configuration.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Value side of a `proxies` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProxyTarget {
    /// Plain target URL, e.g. `"http://127.0.0.1:9001"`.
    Url(String),

    /// Target URL with per-backend options.
    Detailed {
        target: String,
        /// Skip certificate verification towards this backend.
        #[serde(default)]
        insecure_skip_verify: bool,
    },

    /// Anything else. Only tolerated under comment keys.
    Unsupported(IgnoredAny),
}

impl ProxyTarget {
    /// Build a plain URL target.
    pub fn url(target: impl Into<String>) -> Self {
        ProxyTarget::Url(target.into())
    }

    /// Build a target that skips backend certificate verification.
    pub fn insecure(target: impl Into<String>) -> Self {
        ProxyTarget::Detailed {
            target: target.into(),
            insecure_skip_verify: true,
        }
    }
}

/// Keeps the `proxies` table in document order so duplicate hosts resolve
/// deterministically.
fn ordered_proxies<'de, D>(deserializer: D) -> Result<Vec<(String, ProxyTarget)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, ProxyTarget)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of host names to target URLs")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((host, target)) = map.next_entry::<String, ProxyTarget>()? {
                entries.push((host, target));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

/// Listener configuration, owned by the listener manager.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerConfig {
    /// Plain HTTP bind address (e.g., ":8080" or "127.0.0.1:8080").
    pub http_address: String,

    /// HTTPS bind address.
    pub https_address: String,

    /// Whether the HTTPS listener runs.
    pub https_enabled: bool,

    /// Certificate and key used by the HTTPS listener.
    pub tls: TlsConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            http_address: ":8080".to_string(),
            https_address: ":8090".to_string(),
            https_enabled: false,
            tls: TlsConfig::default(),
        }
    }
}

/// TLS configuration for the HTTPS listener.
#[derive(Debug, Clone, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "server.crt".to_string(),
            key_path: "server.key".to_string(),
        }
    }
}

/// Timeout configuration for backend traffic and shutdown.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for a backend to produce response headers, in seconds.
    ///
    /// Only the response head is bounded. Once headers arrive the body is
    /// streamed to the client with no further deadline, so slow or
    /// long-lived bodies (downloads, event streams) are not cut off.
    pub backend_secs: u64,

    /// Idle pooled backend connections are closed after this many seconds.
    pub idle_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            backend_secs: 30,
            idle_secs: 90,
            shutdown_grace_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
