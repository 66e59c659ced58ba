//! Forwarding engine.
//!
//! # Responsibilities
//! - Own the pooled backend clients, one per trust class
//! - Wrap each routing entry in a [`ProxyHandler`]
//! - Rewrite, send and relay one request/response pair
//!
//! # Design Decisions
//! - Single-host semantics: only scheme and authority change, path and
//!   query are forwarded untouched
//! - Bodies are streamed in both directions, never buffered
//! - One attempt per request. The backend timeout bounds the wait for the
//!   response head only; the body streams without a deadline
//! - Dropping the handler future (client went away) cancels the backend call

use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::uri::{Authority, InvalidUri, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::ClientConfig;

use crate::config::TimeoutConfig;
use crate::http::headers::{append_forwarded_for, inject_cors, strip_hop_by_hop};
use crate::http::request::{client_addr, request_id};
use crate::http::response::ForwardError;
use crate::net::tls::{backend_client_config, TlsError};
use crate::observability::{RequestEvent, RequestObserver};
use crate::routing::matcher::request_host;
use crate::routing::{BackendScheme, RoutingEntry};

/// HTTP client used to reach backends (plain HTTP and HTTPS).
pub type BackendClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Backend clients shared by all handlers.
///
/// The non-verifying client only exists when some entry asked for it, and
/// only those entries are handed it.
#[derive(Clone)]
pub struct BackendClients {
    verified: BackendClient,
    insecure: Option<BackendClient>,
}

impl BackendClients {
    pub fn new(timeouts: &TimeoutConfig, with_insecure: bool) -> Result<Self, TlsError> {
        let verified = build_client(backend_client_config(true)?, timeouts);
        let insecure = if with_insecure {
            tracing::warn!("Certificate verification disabled for opted-in HTTPS backends");
            Some(build_client(backend_client_config(false)?, timeouts))
        } else {
            None
        };

        Ok(Self { verified, insecure })
    }

    /// The client matching an entry's trust class.
    pub fn for_entry(&self, entry: &RoutingEntry) -> BackendClient {
        if entry.skip_verify && entry.backend_scheme == BackendScheme::Https {
            if let Some(client) = &self.insecure {
                return client.clone();
            }
            tracing::warn!(
                backend = %entry.backend_url(),
                "No insecure client available, verifying certificates"
            );
        }
        self.verified.clone()
    }
}

fn build_client(tls: ClientConfig, timeouts: &TimeoutConfig) -> BackendClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    let connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .build(connector)
}

/// Request handler bound to one backend.
pub struct ProxyHandler {
    entry: RoutingEntry,
    backend_url: String,
    scheme: Scheme,
    authority: Authority,
    client: BackendClient,
    observer: Arc<dyn RequestObserver>,
    timeout: Duration,
}

impl ProxyHandler {
    pub fn new(
        entry: RoutingEntry,
        client: BackendClient,
        observer: Arc<dyn RequestObserver>,
        timeout: Duration,
    ) -> Result<Self, InvalidUri> {
        let authority = Authority::from_str(&entry.backend_authority)?;
        let scheme = match entry.backend_scheme {
            BackendScheme::Http => Scheme::HTTP,
            BackendScheme::Https => Scheme::HTTPS,
        };

        Ok(Self {
            backend_url: entry.backend_url(),
            entry,
            scheme,
            authority,
            client,
            observer,
            timeout,
        })
    }

    /// Proxy one request. Never fails: backend problems become 502/504.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let client = client_addr(&request);
        let host = request_host(&request).unwrap_or_default();
        let request_id = request_id(&request).to_string();

        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let uri = parts.uri.clone();
        let event = RequestEvent {
            client_addr: client,
            method: &method,
            uri: &uri,
            host: &host,
            backend: &self.backend_url,
        };
        notify("on_request", || self.observer.on_request(&event));

        let mut response = match self.forward(parts, body, client).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    host = %host,
                    backend = %self.backend_url,
                    error = %e,
                    "Upstream error"
                );
                e.into_response()
            }
        };

        inject_cors(response.headers_mut());
        let status = response.status();
        notify("on_response", || {
            self.observer.on_response(&event, status, start.elapsed())
        });
        response
    }

    async fn forward(
        &self,
        mut parts: Parts,
        body: Body,
        client: Option<SocketAddr>,
    ) -> Result<Response, ForwardError> {
        // HTTP/2 clients send :authority instead of Host; keep the name the
        // client used so virtual-hosted backends still see it.
        if !parts.headers.contains_key(header::HOST) {
            if let Some(value) = parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
            {
                parts.headers.insert(header::HOST, value);
            }
        }

        strip_hop_by_hop(&mut parts.headers);
        if let Some(addr) = client {
            append_forwarded_for(&mut parts.headers, addr);
        }
        parts.uri = self.backend_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;

        let request = Request::from_parts(parts, body);
        let response: hyper::Response<hyper::body::Incoming> =
            tokio::time::timeout(self.timeout, self.client.request(request))
                .await
                .map_err(|_| ForwardError::Timeout(self.timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Point `original` at this handler's backend, keeping path and query.
    pub fn backend_uri(&self, original: &Uri) -> Result<Uri, ForwardError> {
        let mut parts = original.clone().into_parts();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(parts).map_err(|e| ForwardError::InvalidRequest(e.into()))
    }
}

/// Run an observer hook. A panicking observer must not take the request
/// down with it.
fn notify(hook: &'static str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        tracing::warn!(hook, "Request observer panicked; request continues");
    }
}

impl std::fmt::Debug for ProxyHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHandler")
            .field("host", &self.entry.host_pattern)
            .field("backend", &self.backend_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
