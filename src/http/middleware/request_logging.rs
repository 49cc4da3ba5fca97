//! Request-logging middleware.
//!
//! Every request runs inside its own logging-context scope:
//!
//! ```text
//! Received
//!     → Identified   (request ID read from the extensions SetRequestIdLayer
//!                     filled in, or generated when running without it)
//!     → PreLogged    (context cleared, request_id bound, "<- ..." logged)
//!     → Delegated    (inner service awaited, errors propagate untouched)
//!     → PostLogged   ("-> ..." logged, severity picked from path + status)
//!     → Completed    (response returned unmodified)
//! ```
//!
//! Health-check traffic is logged at debug level so it is hidden by default;
//! a failing health check still surfaces at error level.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Method, Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::config::RequestLoggingConfig;
use crate::http::request::{client_addr, request_id_str, MakeRequestUuidV7, QueryParams};
use crate::http::response::status_phrase;
use crate::observability::context;
use crate::observability::logging::{self, Severity};

/// Severity of the line logged when a request arrives.
pub fn request_severity(is_health: bool) -> Severity {
    if is_health {
        Severity::Debug
    } else {
        Severity::Info
    }
}

/// Severity of the line logged when a response leaves; first match wins.
pub fn response_severity(is_health: bool, status: u16) -> Severity {
    if is_health && status == 200 {
        Severity::Debug
    } else if status < 400 {
        Severity::Info
    } else {
        Severity::Error
    }
}

/// What is known about a request before it is handled.
#[derive(Debug, Clone)]
struct RequestEntry {
    client: String,
    method: Method,
    path: String,
    query: QueryParams,
    is_health: bool,
}

impl RequestEntry {
    fn from_request<B>(request: &Request<B>, health_path: &str) -> Self {
        let path = request.uri().path().to_owned();
        Self {
            client: client_addr(request),
            method: request.method().clone(),
            is_health: path == health_path,
            query: QueryParams::from_request(request),
            path,
        }
    }

    fn log(&self) {
        let query = if self.query.is_empty() {
            String::new()
        } else {
            self.query.to_string()
        };
        logging::emit(
            request_severity(self.is_health),
            format_args!("<- {} {} {} {}", self.client, self.method, self.path, query),
        );
    }

    fn log_response(&self, status: u16) {
        logging::emit(
            response_severity(self.is_health, status),
            format_args!("-> {} {} {}", self.client, status, status_phrase(status)),
        );
    }
}

/// Layer that applies [`RequestLogging`] to a service.
#[derive(Debug, Clone, Default)]
pub struct RequestLoggingLayer {
    config: Arc<RequestLoggingConfig>,
}

impl RequestLoggingLayer {
    pub fn new(config: RequestLoggingConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogging {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Logs each request on entry and exit with its request ID bound.
#[derive(Debug, Clone)]
pub struct RequestLogging<S> {
    inner: S,
    config: Arc<RequestLoggingConfig>,
}

/// The request's ID, generating and storing one if no layer assigned it.
fn ensure_request_id<B>(request: &mut Request<B>) -> String {
    if request.extensions().get::<RequestId>().is_none() {
        if let Some(id) = MakeRequestUuidV7.make_request_id(request) {
            request.extensions_mut().insert(id);
        }
    }
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| request_id_str(id).into_owned())
        .unwrap_or_default()
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogging<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // Keep the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let request_id = ensure_request_id(&mut request);
        let entry = RequestEntry::from_request(&request, &self.config.health_path);

        Box::pin(context::scope(async move {
            context::clear();
            context::bind([("request_id", request_id)]);
            entry.log();

            let response = inner.call(request).await?;

            entry.log_response(response.status().as_u16());
            Ok(response)
        }))
    }
}
