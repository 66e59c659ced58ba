//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Table Compilation (at startup):
//!     proxies (host → target URL)
//!     → table.rs (skip comments/invalid/disabled, last-wins duplicates)
//!     → RoutingTable (immutable)
//!
//! Incoming Request (Host header or :authority)
//!     → matcher.rs (normalize host)
//!     → router.rs (exact, wildcard, catch-all lookup)
//!     → Return: matched handler or NoMatch
//! ```
//!
//! # Design Decisions
//! - Table built once, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same host always matches the same entry

pub mod matcher;
pub mod router;
pub mod table;

pub use matcher::HostPattern;
pub use router::HostRouter;
pub use table::{BackendScheme, RoutingEntry, RoutingTable, SkipReason, SkippedEntry};
