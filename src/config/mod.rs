//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (LOG_DEBUG, LOG_FORMAT, BIND_ADDRESS, ...)
//!     → loader.rs (parse, fall back to defaults)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - No config files: the service is configured by environment and flags
//! - All fields have defaults so an empty environment is a valid setup
//! - Validation separates parsing from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, parse_bool_flag, ConfigError};
pub use schema::{ListenerConfig, LogFormat, LoggingConfig, RequestLoggingConfig, ServiceConfig};
pub use validation::{validate_config, ValidationError};
