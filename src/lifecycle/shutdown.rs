//! Shutdown coordination.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that the accept loop subscribes to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers still waiting.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one shutdown attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownOutcome {
    /// Every in-flight request finished and the accept loop exited without error.
    pub completed_cleanly: bool,
    /// The deadline elapsed with requests still in flight.
    pub timed_out: bool,
    /// Requests still in flight when the deadline elapsed. They are left
    /// running, not killed.
    pub abandoned: u64,
}

impl ShutdownOutcome {
    pub fn clean() -> Self {
        Self {
            completed_cleanly: true,
            ..Self::default()
        }
    }

    pub fn timed_out(abandoned: u64) -> Self {
        Self {
            completed_cleanly: false,
            timed_out: true,
            abandoned,
        }
    }

    /// Finished within the deadline but not cleanly (the accept loop failed).
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn label(&self) -> &'static str {
        if self.completed_cleanly {
            "clean"
        } else if self.timed_out {
            "timeout"
        } else {
            "error"
        }
    }
}

/// A server that can stop accepting and drain within a deadline.
pub trait GracefulShutdown {
    fn shutdown(self, deadline: Duration) -> impl Future<Output = ShutdownOutcome> + Send;
}
