//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of listener settings (serde handles syntax)
//! - Check that TLS material exists when HTTPS is enabled
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure functions over the parsed configuration
//! - Per-entry problems in `proxies` are not validation errors; the routing
//!   table builder skips those entries instead

use std::path::Path;

use crate::config::schema::{ListenerConfig, TimeoutConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyAddress { field: &'static str },

    #[error("http and https listeners both use {0}")]
    AddressConflict(String),

    #[error("{field} not found: {path}")]
    MissingFile { field: &'static str, path: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
}

/// Validate listener settings.
pub fn validate_listener(config: &ListenerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http_address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress { field: "http_address" });
    }

    if config.https_enabled {
        if config.https_address.trim().is_empty() {
            errors.push(ValidationError::EmptyAddress { field: "https_address" });
        } else if config.https_address.trim() == config.http_address.trim()
            && !config.https_address.trim().ends_with(":0")
        {
            // Port 0 lets the OS pick a distinct port for each listener.
            errors.push(ValidationError::AddressConflict(config.https_address.clone()));
        }

        for (field, path) in [
            ("cert_path", &config.tls.cert_path),
            ("key_path", &config.tls.key_path),
        ] {
            if !Path::new(path).is_file() {
                errors.push(ValidationError::MissingFile {
                    field,
                    path: path.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate timeout settings.
pub fn validate_timeouts(config: &TimeoutConfig) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = [
        ("connect_secs", config.connect_secs),
        ("backend_secs", config.backend_secs),
    ]
    .into_iter()
    .filter(|(_, value)| *value == 0)
    .map(|(field, _)| ValidationError::ZeroTimeout { field })
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
