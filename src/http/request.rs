//! Request inspection for logging.
//!
//! # Responsibilities
//! - Generate a unique, time-sortable request ID for `SetRequestIdLayer`
//! - Screen inbound `x-request-id` headers before they are reused
//! - Extract the client address from the connection info
//! - Parse the query string into ordered key → values pairs
//!
//! # Design Decisions
//! - Request IDs are UUIDv7: 48-bit millisecond timestamp in the high bits,
//!   random low bits, rendered in the fixed 36-character hyphenated form
//!   which sorts lexicographically in generation order
//! - Lookups that can fail (client address) degrade to empty strings

use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID, inbound and on the response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Longest inbound request ID that is accepted verbatim.
const MAX_INBOUND_ID_LEN: usize = 128;

/// Generates UUIDv7 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// The request ID as text, as bound into the logging context.
pub fn request_id_str(id: &RequestId) -> Cow<'_, str> {
    String::from_utf8_lossy(id.header_value().as_bytes())
}

/// Whether an upstream ID is short, non-empty, visible ASCII.
pub fn is_acceptable_request_id(value: &HeaderValue) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty() && bytes.len() <= MAX_INBOUND_ID_LEN && bytes.iter().all(u8::is_ascii_graphic)
}

/// Drop the inbound `x-request-id` unless it is trusted and acceptable.
///
/// Runs in front of `SetRequestIdLayer`, which keeps any header it finds.
pub async fn screen_inbound_request_id(
    State(trusted): State<bool>,
    mut request: Request<Body>,
) -> Request<Body> {
    let keep = trusted
        && request
            .headers()
            .get(X_REQUEST_ID)
            .is_some_and(is_acceptable_request_id);
    if !keep {
        request.headers_mut().remove(X_REQUEST_ID);
    }
    request
}

/// `"{ip}:{port}"` of the peer, or an empty string when unknown.
pub fn client_addr<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("{}:{}", addr.ip(), addr.port()))
        .unwrap_or_default()
}

/// Query parameters in order of first appearance.
///
/// Repeated keys collect their values in order; blank values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, Vec<String>)>);

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match params.0.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value.into_owned()),
                None => params.0.push((key.into_owned(), vec![value.into_owned()])),
            }
        }
        params
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::parse(request.uri().query())
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Renders `{"key": ["v1", "v2"], ...}`.
///
/// Keys and values use Rust string quoting (double quotes, `\u{..}`
/// escapes), not the single-quoted dict notation some log readers expect.
impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, values)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {values:?}")?;
        }
        f.write_str("}")
    }
}
