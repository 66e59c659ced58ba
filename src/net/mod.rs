//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (HTTP socket, or HTTPS socket)
//!     → tls.rs (handshake with the configured certificate, HTTPS only)
//!     → Hand off to the shared dispatch router
//!
//! Outbound:
//!     tls.rs (client configs: verified, or chain check skipped per entry)
//! ```
//!
//! # Design Decisions
//! - Both sockets are bound before any traffic is served
//! - One crypto provider (ring) for inbound and outbound TLS

pub mod listener;
pub mod tls;

pub use listener::{ListenerError, ListenerManager};
pub use tls::TlsError;
