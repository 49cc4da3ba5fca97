//! Request handling pipeline.
//!
//! # Data Flow
//! ```text
//! routes() (built once at startup)
//!     GET /             → index.rs (multi-step operation, optional crash)
//!     GET <health_path> → health.rs
//!     anything else     → 404 {"detail": "Not Found"}
//! ```
//!
//! # Design Decisions
//! - Handlers only use the logging context and logger as leaf functions;
//!   request IDs and entry/exit lines belong to the middleware
//! - Step failures are values (`StepError`), recovered once at the handler

pub mod health;
pub mod index;

use axum::routing::get;
use axum::Router;

use crate::http::response::ApiError;

/// Routing table of the service.
pub fn routes(health_path: &str) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route(health_path, get(health::health))
        .fallback(not_found)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
