//! Host-aware HTTP/HTTPS reverse proxy gateway.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::{ListenerConfig, ProxyConfig};
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown, StartupError};
pub use routing::RoutingTable;
