//! Shutdown coordination with a bounded drain.
//!
//! A trigger fans out to every subscriber. The serving future is then given
//! the drain deadline to finish its in-flight requests; past it, the
//! remaining requests are abandoned and the process exits anyway.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// Drain deadline when none is configured.
pub const DEFAULT_DRAIN_DEADLINE: Duration = Duration::from_secs(10);

/// How a serving future ended under [`Shutdown::run_until_drained`].
#[derive(Debug, PartialEq, Eq)]
pub enum Drain<T> {
    /// Finished on its own, before or within the deadline.
    Completed(T),
    /// Still running when the deadline passed; dropped.
    Abandoned,
}

/// Broadcast shutdown trigger plus the drain deadline that follows it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    drain_deadline: Duration,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::with_drain_deadline(DEFAULT_DRAIN_DEADLINE)
    }

    pub fn with_drain_deadline(drain_deadline: Duration) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, drain_deadline }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn drain_deadline(&self) -> Duration {
        self.drain_deadline
    }

    /// Drive `serve` to completion, giving up once the drain deadline has
    /// passed after a trigger.
    ///
    /// `serve` is expected to stop accepting work on the same trigger.
    pub async fn run_until_drained<F>(&self, serve: F) -> Drain<F::Output>
    where
        F: Future,
    {
        let mut signal = self.subscribe();
        tokio::pin!(serve);

        tokio::select! {
            output = &mut serve => return Drain::Completed(output),
            _ = signal.recv() => {}
        }

        match tokio::time::timeout(self.drain_deadline, serve).await {
            Ok(output) => Drain::Completed(output),
            Err(_) => {
                tracing::warn!(
                    deadline_ms = self.drain_deadline.as_millis() as u64,
                    "Drain deadline passed, abandoning in-flight requests"
                );
                Drain::Abandoned
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
