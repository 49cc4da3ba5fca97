//! correlog: a minimal HTTP service with request-correlated logging.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ ┌─────────────────────────┐    ┌──────────────────┐
//!                     │   request_logging       │───▶│    pipeline      │
//!                     │   (scope, "<- ...")     │    │  GET /, /health  │
//!     Client Response │                         │◀───│                  │
//!     ◀────────────── │   ("-> ...")            │    └────────┬─────────┘
//!                     └───────────┬─────────────┘             │
//!                                 │ bind / log                │ bind / log
//!                                 ▼                           ▼
//!                     ┌───────────────────────────────────────────────┐
//!                     │ observability: task-local context + formatter │──▶ stdout
//!                     └───────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//! - `LOG_DEBUG`: any non-empty value enables debug records
//! - `LOG_FORMAT`: `text` (default) or `json`
//! - `BIND_ADDRESS`, `HEALTH_PATH`, `TRUST_REQUEST_ID_HEADER`, `DRAIN_TIMEOUT_SECS`

use clap::Parser;

use correlog::config::{self, loader, LogFormat};
use correlog::lifecycle::startup;
use correlog::observability::logging;

/// Command-line overrides; environment variables provide the defaults.
#[derive(Debug, Parser)]
#[command(name = "correlog", version, about = "HTTP service with request-correlated logs")]
struct Cli {
    /// Address to listen on.
    #[arg(short, long)]
    bind: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Emit debug records, including health-check traffic.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut config::ServiceConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = loader::from_lookup(|key| std::env::var(key).ok())?;
    cli.apply(&mut config);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    // Note: keep this before any other log call so nothing is emitted unfiltered.
    logging::init(&config.logging)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_level = %config.logging.max_level(),
        "correlog v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
