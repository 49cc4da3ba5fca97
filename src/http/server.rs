//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router from the pipeline's routing table
//! - Wire up request IDs, request logging and panic recovery
//! - Serve connections with peer addresses attached
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::ServiceConfig;
use crate::http::middleware::{catch_panic, RequestLoggingLayer};
use crate::http::request::{screen_inbound_request_id, MakeRequestUuidV7, X_REQUEST_ID};
use crate::pipeline;

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let router = Self::build_router(&config);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: inbound `x-request-id` screening, ID assignment,
    /// ID echo on the response, request logging, panic recovery. No
    /// `TraceLayer` is installed: the request-logging layer already logs
    /// every request and response once.
    pub fn build_router(config: &ServiceConfig) -> Router {
        let trust_inbound = config.request_logging.trust_request_id_header;
        pipeline::routes(&config.request_logging.health_path)
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(RequestLoggingLayer::new(config.request_logging.clone()))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV7))
            .layer(middleware::map_request_with_state(
                trust_inbound,
                screen_inbound_request_id,
            ))
    }

    /// The fully layered router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            health_path = %self.config.request_logging.health_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
