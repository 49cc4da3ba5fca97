//! Tower middleware wrapped around the request pipeline.

pub mod panic;
pub mod request_logging;

pub use panic::catch_panic;
pub use request_logging::{request_severity, response_severity, RequestLogging, RequestLoggingLayer};
