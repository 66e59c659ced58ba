//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --conf path
//!     → loader.rs (resolve next to the executable or in the cwd, parse JSON/TOML)
//!     → ProxyConfig (proxies in document order, timeouts, observability)
//!
//! CLI flags
//!     → ListenerConfig
//!     → validation.rs (semantic checks, fail fast)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload
//! - Optional tables have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_path, ConfigError};
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ProxyConfig;
pub use schema::ProxyTarget;
pub use schema::TimeoutConfig;
pub use schema::TlsConfig;
pub use validation::ValidationError;
