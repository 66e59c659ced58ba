//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP or HTTPS connection
//!     → server.rs (Axum setup, request ID, tracing, host dispatch)
//!     → request.rs (request ID, client address)
//!     → forward.rs (rewrite to backend, send, stream back)
//!     → headers.rs (hop-by-hop, X-Forwarded-For, CORS)
//!     → response.rs (404 / 502 / 504 when the proxy answers itself)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{BackendClients, ProxyHandler};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ForwardError;
pub use server::HttpServer;
