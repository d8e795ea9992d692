//! Startup readiness gate.
//!
//! Request handlers wait here until the one-time initialization routine has
//! finished. The gate is a single-fire latch rather than a reader-writer lock:
//! the exclusive phase happens once, at creation, and never recurs.
//!
//! # States
//! ```text
//! Initializing ──end_init / InitGuard drop──▶ Ready   (one-way)
//! ```
//!
//! # Invariants
//! - While Initializing, `await_ready` does not return.
//! - Once Ready, `await_ready` returns immediately for the rest of the process.
//! - Dropping the [`InitGuard`] releases the gate, so every exit path of the
//!   initialization routine (error, early return, panic) opens it.

use tokio::sync::watch;

use crate::observability::metrics;

/// Shared side of the gate. Cheap to clone; one per handler is fine.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    ready: watch::Receiver<bool>,
}

/// Exclusive side of the gate, held by the initialization routine.
#[derive(Debug)]
#[must_use = "dropping the guard opens the gate immediately"]
pub struct InitGuard {
    ready: watch::Sender<bool>,
}

impl ReadinessGate {
    /// Create a gate that is already in its exclusive phase.
    ///
    /// The guard is handed to the initialization routine; the gate to the
    /// request path. There is no window in which a handler can see an
    /// unheld gate.
    pub fn begin_init() -> (Self, InitGuard) {
        let (tx, rx) = watch::channel(false);
        metrics::set_ready(false);
        tracing::debug!("Readiness gate held for initialization");
        (Self { ready: rx }, InitGuard { ready: tx })
    }

    /// A gate that has no initialization phase at all.
    pub fn ready() -> Self {
        let (gate, guard) = Self::begin_init();
        guard.end_init();
        gate
    }

    /// Block until initialization has ended. Returns at once if it already has.
    ///
    /// Nothing is held after return: this is a barrier, not a per-request lock.
    pub async fn await_ready(&self) {
        if *self.ready.borrow() {
            return;
        }
        let mut ready = self.ready.clone();
        // The guard always publishes `true` before its sender goes away, so a
        // closed channel still carries the final value.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }
}

impl InitGuard {
    /// Release the exclusive phase, waking every waiting handler.
    pub fn end_init(self) {
        // Drop does the work.
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        if !self.ready.send_replace(true) {
            metrics::set_ready(true);
            if std::thread::panicking() {
                tracing::warn!("Initialization panicked; readiness gate released");
            } else {
                tracing::info!("Initialization finished; readiness gate released");
            }
        }
    }
}
