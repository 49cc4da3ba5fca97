//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware / handlers
//!     → context.rs (bind request_id, arg, ... into the task-local store)
//!     → tracing macros (debug!, info!, error!, logging::exception)
//!     → logging.rs (ContextualFormat merges the store into the record)
//!     → stdout, one line per record
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines without parameter threading
//! - The store is task-local, so concurrent requests stay isolated
//! - No span export, sampling or remote sinks

pub mod context;
pub mod logging;

pub use logging::Severity;
