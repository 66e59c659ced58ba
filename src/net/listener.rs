//! Listener management for the HTTP and HTTPS front ends.
//!
//! # Responsibilities
//! - Bind the HTTP listener, and the HTTPS listener when enabled, concurrently
//! - Load the listener certificate before accepting traffic
//! - Serve one shared router on both until shutdown
//!
//! # Design Decisions
//! - Fail fast: a bind or certificate error aborts startup
//! - If one listener stops with an error, the other is shut down too

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::lifecycle::Shutdown;
use crate::net::tls::{load_tls_config, TlsError};

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {protocol} listener on {address}: {source}")]
    Bind {
        protocol: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load the HTTPS certificate.
    #[error("failed to load HTTPS certificate: {0}")]
    Tls(#[from] TlsError),

    /// A listener stopped with an error while serving.
    #[error("{protocol} listener failed: {source}")]
    Serve {
        protocol: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Expand the `:port` shorthand to all interfaces.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}

async fn bind(protocol: &'static str, address: &str) -> Result<TcpListener, ListenerError> {
    let address = normalize_address(address);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ListenerError::Bind {
            protocol,
            address: address.clone(),
            source,
        })?;

    if let Ok(local) = listener.local_addr() {
        tracing::info!(protocol, address = %local, "Listener bound");
    }
    Ok(listener)
}

struct HttpsListener {
    listener: std::net::TcpListener,
    tls: RustlsConfig,
}

/// Owns the bound sockets of both protocols.
pub struct ListenerManager {
    http: TcpListener,
    https: Option<HttpsListener>,
    shutdown_grace: Duration,
}

impl ListenerManager {
    /// Bind all configured listeners. The HTTPS socket and certificate are
    /// prepared concurrently with the HTTP bind.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let https = async {
            if !config.https_enabled {
                return Ok::<_, ListenerError>(None);
            }
            let (listener, tls) = tokio::try_join!(
                bind("https", &config.https_address),
                async {
                    load_tls_config(
                        Path::new(&config.tls.cert_path),
                        Path::new(&config.tls.key_path),
                    )
                    .await
                    .map_err(ListenerError::from)
                }
            )?;
            let listener = listener.into_std().map_err(|source| ListenerError::Bind {
                protocol: "https",
                address: config.https_address.clone(),
                source,
            })?;
            Ok(Some(HttpsListener { listener, tls }))
        };

        let (http, https) = tokio::try_join!(bind("http", &config.http_address), https)?;

        Ok(Self {
            http,
            https,
            shutdown_grace: Duration::from_secs(10),
        })
    }

    /// How long in-flight HTTPS requests get after shutdown is triggered.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn https_addr(&self) -> Option<std::io::Result<SocketAddr>> {
        self.https.as_ref().map(|h| h.listener.local_addr())
    }

    /// Serve `app` on every bound listener until `shutdown` fires or a
    /// listener fails.
    pub async fn serve(self, app: Router, shutdown: Shutdown) -> Result<(), ListenerError> {
        let failed = Shutdown::new();

        let http = {
            let stop = shutdown.clone();
            let failed = failed.clone();
            let service = app.clone().into_make_service_with_connect_info::<SocketAddr>();
            let listener = self.http;
            async move {
                tracing::info!("HTTP server starting");
                axum::serve(listener, service)
                    .with_graceful_shutdown(async move {
                        tokio::select! {
                            _ = stop.wait() => {}
                            _ = failed.wait() => {}
                        }
                    })
                    .await
                    .map_err(|source| ListenerError::Serve {
                        protocol: "http",
                        source,
                    })
            }
        };

        let https = {
            let stop = shutdown.clone();
            let failed = failed.clone();
            let grace = self.shutdown_grace;
            let https = self.https;
            async move {
                let Some(HttpsListener { listener, tls }) = https else {
                    return Ok(());
                };

                let handle = Handle::new();
                let watcher = handle.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = stop.wait() => {}
                        _ = failed.wait() => {}
                    }
                    watcher.graceful_shutdown(Some(grace));
                });

                tracing::info!("HTTPS server starting");
                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle)
                    .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                    .await
                    .map_err(|source| ListenerError::Serve {
                        protocol: "https",
                        source,
                    })
            }
        };

        let (http_result, https_result) = tokio::join!(
            stop_others_on_error(http, &failed),
            stop_others_on_error(https, &failed)
        );
        http_result?;
        https_result?;

        tracing::info!("Listeners stopped");
        Ok(())
    }
}

async fn stop_others_on_error<F>(server: F, failed: &Shutdown) -> Result<(), ListenerError>
where
    F: std::future::Future<Output = Result<(), ListenerError>>,
{
    let result = server.await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Listener failed, stopping the others");
        failed.trigger();
    }
    result
}
