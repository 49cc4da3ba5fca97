//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits so the effective configuration can be
//! dumped or supplied programmatically.

use serde::{Deserialize, Serialize};
use tracing::Level;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Log verbosity and output format.
    pub logging: LoggingConfig,

    /// Request-logging middleware settings.
    pub request_logging: RequestLoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,

    /// Seconds in-flight requests may take to finish after shutdown starts.
    pub drain_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            drain_timeout_secs: 10,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit debug records (health-check traffic included).
    pub verbose: bool,

    /// Output format of each record.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Most verbose level that reaches the sink.
    pub fn max_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// Directive for the subscriber's `EnvFilter`.
    pub fn filter_directive(&self) -> String {
        self.max_level().as_str().to_ascii_lowercase()
    }
}

/// Output format of log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp [level] message key=value ...`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Request-logging middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLoggingConfig {
    /// Path whose successful traffic is logged at debug level.
    pub health_path: String,

    /// Reuse an inbound `x-request-id` header instead of generating an id
    /// (set when a load balancer already assigns one).
    pub trust_request_id_header: bool,
}

impl Default for RequestLoggingConfig {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            trust_request_id_header: false,
        }
    }
}
