//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding engine
//!     → observer.rs (RequestObserver hook, per request)
//!         → logging (one structured line per request)
//!         → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;
pub mod observer;

pub use observer::{LoggingObserver, NoopObserver, RequestEvent, RequestObserver};
