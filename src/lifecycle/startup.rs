//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener from the validated configuration
//! - Install signal handling before traffic is accepted
//! - Run the HTTP server until shutdown, bounded by the drain deadline
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Logging is initialized by the caller, before this runs

use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Drain;
use crate::lifecycle::{signals, Shutdown};

/// Error type for startup and serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind, serve and block until a shutdown signal is handled.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown =
        Shutdown::with_drain_deadline(Duration::from_secs(config.listener.drain_timeout_secs));
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config).run(listener, shutdown.subscribe());
    match shutdown.run_until_drained(server).await {
        Drain::Completed(result) => result?,
        Drain::Abandoned => {}
    }
    Ok(())
}
