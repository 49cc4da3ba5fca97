//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of values parsed from the environment
//! - Bind address must be a socket address
//! - Health path must be a routable absolute path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("bind address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("health path {0:?} must start with '/', differ from the index route and contain no wildcard")]
    InvalidHealthPath(String),
}

/// Check `config`, collecting every violation.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind_address = &config.listener.bind_address;
    if bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(bind_address.clone()));
    }

    let health_path = &config.request_logging.health_path;
    if !health_path.starts_with('/')
        || health_path == "/"
        || health_path.contains(['{', '}', '*'])
    {
        errors.push(ValidationError::InvalidHealthPath(health_path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
