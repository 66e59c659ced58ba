//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate listener and timeout settings
//! - Build the routing table and register one handler per entry
//! - Start the metrics endpoint when enabled
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, listeners last (traffic only when ready)
//! - A bad entry in `proxies` is not a startup error; it is skipped

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::validation::{validate_listener, validate_timeouts};
use crate::config::{ListenerConfig, ProxyConfig, ValidationError};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::listener::{ListenerError, ListenerManager};
use crate::net::tls::{install_crypto_provider, TlsError};
use crate::observability::{metrics, LoggingObserver, RequestObserver};
use crate::routing::RoutingTable;

/// Fatal error while bringing the gateway up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    #[error("failed to prepare backend clients: {0}")]
    Tls(#[from] TlsError),

    #[error("invalid metrics address {address}: {source}")]
    MetricsAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A gateway with its routes registered and its listeners bound.
pub struct Gateway {
    server: HttpServer,
    listeners: ListenerManager,
}

impl Gateway {
    /// Prepare the gateway with the default [`LoggingObserver`].
    pub async fn prepare(
        config: &ProxyConfig,
        listener: &ListenerConfig,
    ) -> Result<Self, StartupError> {
        Self::prepare_with_observer(config, listener, Arc::new(LoggingObserver)).await
    }

    /// Prepare the gateway, reporting requests to `observer`.
    pub async fn prepare_with_observer(
        config: &ProxyConfig,
        listener: &ListenerConfig,
        observer: Arc<dyn RequestObserver>,
    ) -> Result<Self, StartupError> {
        install_crypto_provider();

        let mut errors = Vec::new();
        if let Err(e) = validate_listener(listener) {
            errors.extend(e);
        }
        if let Err(e) = validate_timeouts(&config.timeouts) {
            errors.extend(e);
        }
        if !errors.is_empty() {
            return Err(StartupError::Invalid(errors));
        }

        let table = RoutingTable::build(config.proxies.iter().cloned(), listener.https_enabled);
        tracing::info!(
            routes = table.len(),
            skipped = table.skipped().len(),
            "Routing table built"
        );

        if config.observability.metrics_enabled {
            let address = &config.observability.metrics_address;
            let addr: SocketAddr = address.parse().map_err(|source| StartupError::MetricsAddress {
                address: address.clone(),
                source,
            })?;
            metrics::init_metrics(addr)?;
        }

        let server = HttpServer::new(&table, &config.timeouts, observer)?;

        let listeners = ListenerManager::bind(listener)
            .await?
            .with_shutdown_grace(Duration::from_secs(config.timeouts.shutdown_grace_secs));

        Ok(Self { server, listeners })
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.listeners.http_addr()
    }

    pub fn https_addr(&self) -> Option<std::io::Result<SocketAddr>> {
        self.listeners.https_addr()
    }

    pub fn route_count(&self) -> usize {
        self.server.route_count()
    }

    /// Serve until `shutdown` fires or a listener fails.
    pub async fn serve(self, shutdown: Shutdown) -> Result<(), StartupError> {
        self.listeners.serve(self.server.router(), shutdown).await?;
        Ok(())
    }
}

/// Bring the gateway up and serve until shutdown.
pub async fn run(
    config: ProxyConfig,
    listener: ListenerConfig,
    shutdown: Shutdown,
) -> Result<(), StartupError> {
    let gateway = Gateway::prepare(&config, &listener).await?;
    gateway.serve(shutdown).await
}
