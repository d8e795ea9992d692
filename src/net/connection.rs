//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests currently being handled
//! - Report how many requests a timed-out drain abandons
//! - Give each request a sequence number for tracing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::observability::metrics;

/// Identifier of one request, unique per tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestSeq(u64);

impl std::fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Tracks in-flight requests for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
    next_seq: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(active);
        InFlightGuard {
            active: Arc::clone(&self.active),
            seq: RequestSeq(self.next_seq.fetch_add(1, Ordering::Relaxed) + 1),
        }
    }

    /// Number of requests currently being handled.
    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a request's lifetime.
///
/// Dropped when the response is produced, or when the request future is
/// cancelled because its connection went away.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
    seq: RequestSeq,
}

impl InFlightGuard {
    pub fn seq(&self) -> RequestSeq {
        self.seq
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(remaining);
        tracing::trace!(request = %self.seq, "Request finished");
    }
}

/// Middleware counting every request for the duration of its handling.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let guard = tracker.track();
    tracing::trace!(request = %guard.seq(), path = %request.uri().path(), "Request started");
    let response = next.run(request).await;
    drop(guard);
    response
}
