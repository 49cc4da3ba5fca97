//! Log output of the request-logging middleware and the pipeline.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use futures_util::future::join_all;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

use correlog::config::{LogFormat, RequestLoggingConfig, ServiceConfig};
use correlog::http::middleware::catch_panic;
use correlog::http::{HttpServer, RequestLoggingLayer, X_REQUEST_ID};
use correlog::observability::context;

mod common;

fn records(capture: &common::LogCapture) -> Vec<Value> {
    capture
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).expect("one JSON object per line"))
        .collect()
}

fn messages(records: &[Value]) -> Vec<&str> {
    records.iter().filter_map(|r| r["message"].as_str()).collect()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let (status, _, body) = send_with_request_id(router, request).await;
    (status, body)
}

/// Like `send`, also returning the `x-request-id` response header.
async fn send_with_request_id(
    router: &Router,
    request: Request<Body>,
) -> (StatusCode, Option<String>, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get(X_REQUEST_ID)
        .map(|v| v.to_str().unwrap().to_owned());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, request_id, String::from_utf8(bytes.to_vec()).unwrap())
}

fn with_inbound_id(uri: &str, id: &'static str) -> Request<Body> {
    let mut request = common::get(uri, "10.0.0.1:4000");
    request
        .headers_mut()
        .insert(X_REQUEST_ID, axum::http::HeaderValue::from_static(id));
    request
}

fn router() -> Router {
    HttpServer::build_router(&ServiceConfig::default())
}

#[tokio::test]
async fn test_index_logs_every_step_with_context() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let (status, body) = send(&router(), common::get("/?crash=false", "10.0.0.1:4000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "\"index\"");

    let records = records(&capture);
    let messages = messages(&records);
    assert_eq!(messages.first(), Some(&r#"<- 10.0.0.1:4000 GET / {"crash": ["false"]}"#));
    assert_eq!(messages.last(), Some(&"-> 10.0.0.1:4000 200 OK"));
    assert_eq!(messages[1], "Getting index");
    assert_eq!(
        &messages[2..11],
        ["Step 1", "Step 2", "Step 3"].repeat(3).as_slice()
    );

    // One request ID on every record of the request.
    let request_id = records[0]["request_id"].as_str().unwrap();
    assert_eq!(request_id.len(), 36);
    assert!(records.iter().all(|r| r["request_id"] == request_id));

    // The argument is bound per iteration.
    let args: Vec<&str> = records[2..11].iter().map(|r| r["arg"].as_str().unwrap()).collect();
    assert_eq!(args, ["a", "a", "a", "b", "b", "b", "c", "c", "c"]);
    assert!(records[0].get("arg").is_none());

    assert_eq!(records[0]["level"], "info");
    assert_eq!(records[records.len() - 1]["level"], "info");
}

#[tokio::test]
async fn test_response_echoes_logged_request_id() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let (_, header, _) = send_with_request_id(&router(), common::get("/", "10.0.0.1:4000")).await;
    let header = header.expect("x-request-id on the response");

    let records = records(&capture);
    assert_eq!(records[0]["request_id"], header);
    assert_eq!(header.len(), 36);
}

#[tokio::test]
async fn test_inbound_request_id_ignored_by_default() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let (_, header, _) = send_with_request_id(&router(), with_inbound_id("/", "from-lb")).await;

    assert_ne!(header.as_deref(), Some("from-lb"));
    assert!(records(&capture).iter().all(|r| r["request_id"] != "from-lb"));
}

#[tokio::test]
async fn test_inbound_request_id_trusted_when_enabled() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let mut config = ServiceConfig::default();
    config.request_logging.trust_request_id_header = true;
    let router = HttpServer::build_router(&config);

    let (_, header, _) = send_with_request_id(&router, with_inbound_id("/", "from-lb")).await;
    assert_eq!(header.as_deref(), Some("from-lb"));
    assert!(records(&capture).iter().all(|r| r["request_id"] == "from-lb"));

    // A malformed inbound ID is replaced even when trusted.
    let (_, header, _) = send_with_request_id(&router, with_inbound_id("/", "two words")).await;
    assert_eq!(header.map(|h| h.len()), Some(36));
}

#[tokio::test]
async fn test_panicking_handler_logged_as_exception_with_context() {
    async fn explode() -> &'static str {
        context::bind([("arg", "a")]);
        panic!("Kaboom")
    }

    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let router = Router::new()
        .route("/", get(explode))
        .layer(CatchPanicLayer::custom(catch_panic))
        .layer(RequestLoggingLayer::new(RequestLoggingConfig::default()));
    let (status, body) = send(&router, common::get("/", "10.0.0.1:4000")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["detail"], "Internal Server Error");

    let records = records(&capture);
    let request_id = records[0]["request_id"].as_str().unwrap();
    let exception = records
        .iter()
        .find(|r| r["level"] == "exception")
        .expect("exception record");
    assert_eq!(exception["message"], "Kaboom");
    assert_eq!(exception["request_id"], request_id);
    assert_eq!(exception["arg"], "a");
    assert!(exception["exception"].as_str().unwrap().starts_with("panic: Kaboom"));

    let last = records.last().unwrap();
    assert_eq!(last["level"], "error");
    assert_eq!(last["message"], "-> 10.0.0.1:4000 500 Internal Server Error");
    assert_eq!(last["request_id"], request_id);
}

#[tokio::test]
async fn test_crash_returns_generic_error_and_logs_exception() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let (status, body) = send(&router(), common::get("/?crash=true", "10.0.0.1:4000")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["detail"], "Internal could not process stuff");
    assert!(!body.to_string().contains("Kaboom"));

    let records = records(&capture);
    let exception = records
        .iter()
        .find(|r| r["level"] == "exception")
        .expect("exception record");
    assert_eq!(exception["message"], "Kaboom");
    assert_eq!(exception["arg"], "a");
    assert!(exception["exception"].as_str().unwrap().contains("StepError: Kaboom"));

    let last = records.last().unwrap();
    assert_eq!(last["level"], "error");
    assert_eq!(last["message"], "-> 10.0.0.1:4000 500 Internal Server Error");

    // Only step one ran before the failure.
    assert_eq!(messages(&records).iter().filter(|m| m.starts_with("Step")).count(), 1);
}

#[tokio::test]
async fn test_health_is_silent_by_default() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let (status, body) = send(&router(), common::get("/health", "10.0.0.1:4000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "\"ok\"");
    assert!(capture.lines().is_empty());
}

#[tokio::test]
async fn test_health_logged_at_debug_when_verbose() {
    let (capture, _guard) = common::capture_logs(true, LogFormat::Json);

    send(&router(), common::get("/health", "10.0.0.1:4000")).await;

    let records = records(&capture);
    assert_eq!(messages(&records), ["<- 10.0.0.1:4000 GET /health ", "-> 10.0.0.1:4000 200 OK"]);
    assert!(records.iter().all(|r| r["level"] == "debug"));
}

#[tokio::test]
async fn test_failing_health_check_surfaces_as_error() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let router = Router::new()
        .route("/health", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .layer(RequestLoggingLayer::new(RequestLoggingConfig::default()));
    send(&router, common::get("/health", "10.0.0.1:4000")).await;

    // The entry line stays at debug; only the failing exit line shows.
    let records = records(&capture);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "error");
    assert_eq!(records[0]["message"], "-> 10.0.0.1:4000 500 Internal Server Error");
}

#[tokio::test]
async fn test_unknown_route_logged_as_error() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let (status, body) = send(&router(), common::get("/missing", "10.0.0.1:4000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Not Found"));

    let records = records(&capture);
    assert_eq!(records[0]["level"], "info");
    assert_eq!(records[1]["level"], "error");
    assert_eq!(records[1]["message"], "-> 10.0.0.1:4000 404 Not Found");
}

#[tokio::test]
async fn test_entry_logged_before_exit() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    send(&router(), common::get("/", "10.0.0.1:4000")).await;

    let messages: Vec<String> = messages(&records(&capture)).into_iter().map(str::to_owned).collect();
    let entry = messages.iter().position(|m| m.starts_with("<- ")).unwrap();
    let exit = messages.iter().position(|m| m.starts_with("-> ")).unwrap();
    assert!(entry < exit);
    assert_eq!(entry, 0);
    assert_eq!(exit, messages.len() - 1);
}

#[tokio::test]
async fn test_missing_client_address_is_empty() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    send(&router(), request).await;

    let records = records(&capture);
    let messages = messages(&records);
    assert_eq!(messages[0], "<-  GET / ");
    assert_eq!(*messages.last().unwrap(), "->  200 OK");
}

#[tokio::test]
async fn test_text_format_appends_context_pairs() {
    let (capture, _guard) = common::capture_logs(false, LogFormat::Text);

    send(&router(), common::get("/", "10.0.0.1:4000")).await;

    let step_three = capture.matching("Step 3");
    assert_eq!(step_three.len(), 3);
    assert!(step_three[0].contains("[info     ] Step 3 request_id="), "{}", step_three[0]);
    assert!(step_three[0].ends_with(" arg=a"));
    assert!(step_three[2].ends_with(" arg=c"));
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_context() {
    async fn slow(request: Request<Body>) -> &'static str {
        let tag = request.uri().query().unwrap_or_default().to_owned();
        context::bind([("tag", tag)]);
        for _ in 0..5 {
            tokio::task::yield_now().await;
            tracing::info!("working");
        }
        "done"
    }

    let (capture, _guard) = common::capture_logs(false, LogFormat::Json);

    let router = Router::new()
        .route("/", get(slow))
        .layer(RequestLoggingLayer::new(RequestLoggingConfig::default()));

    let requests = (0..20).map(|i| send(&router, common::get(&format!("/?t{i}=x"), "10.0.0.1:4000")));
    let responses = join_all(requests).await;
    assert!(responses.iter().all(|(status, _)| *status == StatusCode::OK));

    let records = records(&capture);
    let mut request_ids = std::collections::HashSet::new();
    for record in records.iter().filter(|r| r["message"] == "working") {
        let request_id = record["request_id"].as_str().unwrap();
        request_ids.insert(request_id.to_owned());

        let entry = records
            .iter()
            .find(|r| r["request_id"] == request_id && r["message"].as_str().unwrap().starts_with("<- "))
            .unwrap();
        let tag = record["tag"].as_str().unwrap();
        let key = tag.trim_end_matches("=x");
        assert!(
            entry["message"].as_str().unwrap().contains(&format!("\"{key}\"")),
            "{record} logged under {entry}"
        );
    }
    assert_eq!(request_ids.len(), 20);
    assert_eq!(records.iter().filter(|r| r["message"] == "working").count(), 100);
}
