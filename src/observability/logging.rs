//! Structured logging setup.
//!
//! `RUST_LOG` takes precedence; otherwise the level given on the command
//! line applies to this crate and to tower-http's request spans.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a log level.
pub fn default_directive(level: &str) -> String {
    format!("revproxy={level},tower_http={level}")
}

/// Initialize the global tracing subscriber.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
