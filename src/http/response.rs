//! Response helpers.
//!
//! # Responsibilities
//! - Map status codes to their reason phrase for log lines
//! - Translate handler errors into client-facing error responses
//!
//! # Design Decisions
//! - Unknown or out-of-range codes yield an empty phrase, never an error
//! - Error bodies carry a fixed detail message; internal error text is
//!   logged, never returned

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Reason phrase of `code`, or `""` if the code has none.
pub fn status_phrase(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}

/// Errors a handler may return to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    /// Processing failed; `detail` is the message shown to the client.
    #[error("{detail}")]
    Internal { detail: &'static str },
}

impl ApiError {
    pub fn internal(detail: &'static str) -> Self {
        Self::Internal { detail }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
