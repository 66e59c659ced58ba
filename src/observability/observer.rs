//! Per-request observer hook.
//!
//! The forwarding engine reports every proxied request through a
//! [`RequestObserver`]. Observers are synchronous and infallible: they run
//! on the request path, so implementations must not block.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode, Uri};

use crate::observability::metrics;

/// What the observer sees about a proxied request.
#[derive(Debug, Clone, Copy)]
pub struct RequestEvent<'a> {
    pub client_addr: Option<SocketAddr>,
    pub method: &'a Method,
    pub uri: &'a Uri,
    /// Normalized inbound host.
    pub host: &'a str,
    /// Backend base URL the request goes to.
    pub backend: &'a str,
}

/// Side-effecting hook invoked by the forwarding engine.
pub trait RequestObserver: Send + Sync {
    /// Called before the request is forwarded.
    fn on_request(&self, event: &RequestEvent<'_>);

    /// Called once the response status is known.
    fn on_response(&self, _event: &RequestEvent<'_>, _status: StatusCode, _elapsed: Duration) {}
}

/// Default observer: one log line per request plus request metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RequestObserver for LoggingObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        let client = event
            .client_addr
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::info!(
            client = %client,
            method = %event.method,
            uri = %event.uri,
            host = %event.host,
            backend = %event.backend,
            "Request"
        );
    }

    fn on_response(&self, event: &RequestEvent<'_>, status: StatusCode, elapsed: Duration) {
        tracing::debug!(
            host = %event.host,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Response"
        );
        metrics::record_request(event.method.as_str(), status.as_u16(), event.backend, elapsed);
    }
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn on_request(&self, _event: &RequestEvent<'_>) {}
}
