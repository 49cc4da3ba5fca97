//! Configuration loading from the process environment.

use clap::ValueEnum;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Verbose logging toggle; any non-empty value enables debug records.
pub const LOG_DEBUG_ENV: &str = "LOG_DEBUG";
/// Log output format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
/// Listener bind address.
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";
/// Health-check route.
pub const HEALTH_PATH_ENV: &str = "HEALTH_PATH";
/// Whether an inbound `x-request-id` header is reused.
pub const TRUST_REQUEST_ID_HEADER_ENV: &str = "TRUST_REQUEST_ID_HEADER";
/// Seconds in-flight requests get to finish on shutdown.
pub const DRAIN_TIMEOUT_SECS_ENV: &str = "DRAIN_TIMEOUT_SECS";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    let config = from_lookup(|key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build a configuration from `lookup`, falling back to defaults.
///
/// Values are parsed but not validated; callers apply their overrides first
/// and validate the result.
pub fn from_lookup<F>(lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ServiceConfig::default();

    config.logging.verbose = lookup(LOG_DEBUG_ENV).is_some_and(|v| !v.is_empty());

    if let Some(value) = lookup(LOG_FORMAT_ENV) {
        config.logging.format = LogFormat::from_str(&value, true).map_err(|_| {
            ConfigError::InvalidValue {
                key: LOG_FORMAT_ENV,
                value,
            }
        })?;
    }

    if let Some(value) = lookup(BIND_ADDRESS_ENV) {
        config.listener.bind_address = value;
    }

    if let Some(value) = lookup(DRAIN_TIMEOUT_SECS_ENV) {
        config.listener.drain_timeout_secs =
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: DRAIN_TIMEOUT_SECS_ENV,
                value,
            })?;
    }

    if let Some(value) = lookup(HEALTH_PATH_ENV) {
        config.request_logging.health_path = value;
    }

    if let Some(value) = lookup(TRUST_REQUEST_ID_HEADER_ENV) {
        config.request_logging.trust_request_id_header =
            parse_bool_flag(&value).ok_or(ConfigError::InvalidValue {
                key: TRUST_REQUEST_ID_HEADER_ENV,
                value,
            })?;
    }

    Ok(config)
}

/// Parse a boolean-like flag (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`,
/// `t`/`f`, `y`/`n`), ignoring case and surrounding whitespace.
pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}
