//! revproxy: host-aware HTTP/HTTPS reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────┐
//!                   │                    REVPROXY                      │
//!                   │                                                  │
//!  Client Request   │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!  ─────────────────┼─▶│   net    │──▶│  http    │──▶│   routing   │   │
//!                   │  │ listener │   │ server   │   │ host router │   │
//!                   │  │ (+tls)   │   └──────────┘   └──────┬──────┘   │
//!                   │  └──────────┘                         │          │
//!                   │                                       ▼          │
//!  Client Response  │                ┌──────────┐   ┌─────────────┐    │
//!  ◀────────────────┼────────────────│ headers  │◀──│   forward   │◀───┼── Backend
//!                   │                │  (CORS)  │   │ ProxyHandler│    │
//!                   │                └──────────┘   └─────────────┘    │
//!                   │                                                  │
//!                   │   config · observability · lifecycle             │
//!                   └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use revproxy::config::{load_config, resolve_path, ListenerConfig, TlsConfig};
use revproxy::lifecycle::{run, signals, Shutdown};
use revproxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "revproxy", version)]
#[command(about = "Host-aware HTTP/HTTPS reverse proxy", long_about = None)]
struct Args {
    /// HTTP listen address
    #[arg(long, default_value = ":8080")]
    http: String,

    /// HTTPS listen address
    #[arg(long, default_value = ":8090")]
    https: String,

    /// Serve HTTPS as well and allow https backends
    /// (`--https-enabled`, `--https-enabled=true`, `--https-enabled false`)
    #[arg(
        long,
        action = clap::ArgAction::Set,
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    https_enabled: bool,

    /// Proxy configuration file (JSON, or TOML by extension)
    #[arg(long, default_value = "conf.json")]
    conf: PathBuf,

    /// HTTPS certificate (PEM)
    #[arg(long, default_value = "server.crt")]
    cert: PathBuf,

    /// HTTPS private key (PEM)
    #[arg(long, default_value = "server.key")]
    key: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level);

    tracing::info!("revproxy v{} starting", env!("CARGO_PKG_VERSION"));

    let conf_path = resolve_path(&args.conf);
    let config = load_config(&conf_path).map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    tracing::info!(
        path = %conf_path.display(),
        proxies = config.proxies.len(),
        "Configuration loaded"
    );

    let listener = ListenerConfig {
        http_address: args.http,
        https_address: args.https,
        https_enabled: args.https_enabled,
        tls: TlsConfig {
            cert_path: resolve_path(&args.cert).display().to_string(),
            key_path: resolve_path(&args.key).display().to_string(),
        },
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = run(config, listener, shutdown).await {
        tracing::error!(error = %e, "Gateway stopped with an error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
