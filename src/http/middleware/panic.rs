//! Recovery from panicking route handlers.
//!
//! Installed inside the request-logging layer, so the panic is logged with
//! the request context still bound and the exit line reports the 500.

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::http::response::ApiError;
use crate::observability::logging;

type Panic = Box<dyn Any + Send + 'static>;

/// Detail returned to the client; the panic message is only logged.
pub const PANIC_DETAIL: &str = "Internal Server Error";

/// Log the panic at exception severity and answer with a 500.
pub fn catch_panic(panic: Panic) -> Response {
    logging::caught_panic(panic.as_ref());
    ApiError::internal(PANIC_DETAIL).into_response()
}
