//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info)
//!     → request.rs (x-request-id screening, UUIDv7 request ID)
//!     → middleware/request_logging.rs (context scope, entry log)
//!     → middleware/panic.rs (panics become logged 500s)
//!     → pipeline (route handlers)
//!     → middleware/request_logging.rs (exit log)
//!     → response.rs (error bodies)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::RequestLoggingLayer;
pub use request::{MakeRequestUuidV7, QueryParams, X_REQUEST_ID};
pub use response::{status_phrase, ApiError};
pub use server::HttpServer;
