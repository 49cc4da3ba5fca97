//! Liveness route.

use axum::Json;

/// Always answers `"ok"`.
pub async fn health() -> Json<&'static str> {
    Json("ok")
}
