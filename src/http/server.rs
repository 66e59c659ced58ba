//! Dispatch surface shared by the HTTP and HTTPS listeners.
//!
//! # Responsibilities
//! - Wrap every routing entry in a [`ProxyHandler`] and register it by host
//! - Build the Axum Router whose fallback dispatches on the request host
//! - Wire up middleware (tracing, request ID)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::TimeoutConfig;
use crate::http::forward::{BackendClients, ProxyHandler};
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::no_route;
use crate::net::tls::TlsError;
use crate::observability::RequestObserver;
use crate::routing::matcher::request_host;
use crate::routing::{HostRouter, RoutingTable};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<HostRouter<Arc<ProxyHandler>>>,
}

/// Host-aware dispatch surface for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Register one handler per routing entry.
    pub fn new(
        table: &RoutingTable,
        timeouts: &TimeoutConfig,
        observer: Arc<dyn RequestObserver>,
    ) -> Result<Self, TlsError> {
        let clients = BackendClients::new(timeouts, table.needs_insecure_client())?;
        let backend_timeout = Duration::from_secs(timeouts.backend_secs);

        let mut routes = HostRouter::new();
        for entry in table.entries() {
            let client = clients.for_entry(entry);
            match ProxyHandler::new(entry.clone(), client, observer.clone(), backend_timeout) {
                Ok(handler) => {
                    tracing::info!(
                        host = %entry.host_pattern,
                        backend = %entry.backend_url(),
                        skip_verify = entry.skip_verify,
                        "New proxy"
                    );
                    routes.insert(entry.host_pattern.clone(), Arc::new(handler));
                }
                Err(e) => {
                    tracing::warn!(
                        host = %entry.host_pattern,
                        authority = %entry.backend_authority,
                        error = %e,
                        "Skipping proxy with unusable backend authority"
                    );
                }
            }
        }

        if routes.is_empty() {
            tracing::warn!("No proxies registered; every request will be answered with 404");
        }

        let state = AppState {
            routes: Arc::new(routes),
        };
        let router = Self::build_router(state.clone());

        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router both listeners serve.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Number of registered host patterns.
    pub fn route_count(&self) -> usize {
        self.state.routes.len()
    }
}

/// Looks up the handler for the request host and forwards.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let handler = request_host(&request).and_then(|host| state.routes.lookup(&host).cloned());

    match handler {
        Some(handler) => handler.handle(request).await,
        None => {
            tracing::warn!(
                request_id = %request_id(&request),
                host = ?request.headers().get(axum::http::header::HOST),
                path = %request.uri().path(),
                "No route matched"
            );
            no_route()
        }
    }
}
