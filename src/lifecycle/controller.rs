//! Lifecycle controller: signal-driven drain and re-exec.
//!
//! # State Machine
//! ```text
//! AwaitingSignal ──Ignored──▶ AwaitingSignal
//! AwaitingSignal ──Reload | Terminate──▶ Draining
//! Draining ──shutdown(deadline) returns──▶ Done
//! Done: respawn if the trigger was Reload, then report over the one-shot
//! ```
//!
//! The controller owns [`ServerState`]; the server only obeys `shutdown`.
//! Every failure on this path (drain timeout, respawn failure) is logged and
//! the controller still reaches Done.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::lifecycle::respawn::{Respawn, RespawnError};
use crate::lifecycle::shutdown::{GracefulShutdown, ShutdownOutcome};
use crate::lifecycle::signals::{SignalClass, SignalEvent};
use crate::observability::metrics;

/// Externally visible server lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

/// What happened during shutdown, delivered to the main routine.
#[derive(Debug)]
pub struct LifecycleReport {
    /// The signal that started the drain.
    pub trigger: SignalEvent,
    pub outcome: ShutdownOutcome,
    /// `Some` only when a respawn was attempted.
    pub respawned: Option<Result<u32, RespawnError>>,
}

pub struct LifecycleController<R> {
    drain_timeout: Duration,
    respawner: Option<R>,
    state: watch::Sender<ServerState>,
}

impl<R: Respawn + Send> LifecycleController<R> {
    /// `respawner` is `None` when re-exec on hangup is disabled.
    pub fn new(drain_timeout: Duration, respawner: Option<R>) -> Self {
        let (state, _) = watch::channel(ServerState::Starting);
        Self {
            drain_timeout,
            respawner,
            state,
        }
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Wait for a shutdown-class signal, drain `server`, optionally respawn,
    /// then report through `done`.
    pub async fn run<S>(
        self,
        mut signals: mpsc::Receiver<SignalEvent>,
        server: S,
        done: oneshot::Sender<LifecycleReport>,
    ) where
        S: GracefulShutdown + Send,
    {
        self.transition(ServerState::Serving);

        let trigger = await_shutdown_signal(&mut signals).await;

        self.transition(ServerState::ShuttingDown);
        tracing::info!(
            signal = %trigger,
            drain_timeout_secs = self.drain_timeout.as_secs_f64(),
            "Draining in-flight requests"
        );

        let outcome = server.shutdown(self.drain_timeout).await;
        metrics::record_shutdown(outcome.label());
        if outcome.timed_out {
            tracing::warn!(
                abandoned = outcome.abandoned,
                "Drain deadline elapsed; abandoning in-flight requests"
            );
        } else if outcome.completed_cleanly {
            tracing::info!("All in-flight requests drained");
        } else {
            tracing::error!("Server stopped with an error during drain");
        }

        self.transition(ServerState::Stopped);

        let respawned = match (&self.respawner, trigger.class) {
            (Some(respawner), SignalClass::Reload) => Some(respawn(respawner)),
            _ => None,
        };

        let report = LifecycleReport {
            trigger,
            outcome,
            respawned,
        };
        if done.send(report).is_err() {
            tracing::warn!("Nobody is waiting for the shutdown report");
        }
    }

    fn transition(&self, next: ServerState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = ?previous, to = ?next, "Server state changed");
    }
}

async fn await_shutdown_signal(signals: &mut mpsc::Receiver<SignalEvent>) -> SignalEvent {
    loop {
        match signals.recv().await {
            Some(event) if event.class.triggers_shutdown() => {
                tracing::info!(signal = %event, class = ?event.class, "Shutdown signal received");
                return event;
            }
            Some(event) => {
                tracing::info!(signal = %event, "Ignoring signal");
            }
            None => {
                tracing::error!("Signal source closed; shutting down");
                return SignalEvent {
                    raw: 0,
                    name: "signal source closed",
                    class: SignalClass::Terminate,
                };
            }
        }
    }
}

fn respawn<R: Respawn>(respawner: &R) -> Result<u32, RespawnError> {
    let result = respawner.respawn();
    match &result {
        Ok(pid) => {
            metrics::record_respawn("ok");
            tracing::info!(pid, "Started replacement process");
        }
        Err(e) => {
            metrics::record_respawn("error");
            tracing::error!(error = %e, "Failed to start replacement process");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const HANGUP: SignalEvent = SignalEvent {
        raw: 1,
        name: "hangup",
        class: SignalClass::Reload,
    };

    fn event(raw: i32, name: &'static str) -> SignalEvent {
        SignalEvent::new(raw, name)
    }

    #[derive(Clone)]
    struct FakeServer {
        shutdowns: Arc<AtomicUsize>,
        outcome: ShutdownOutcome,
    }

    impl FakeServer {
        fn new(outcome: ShutdownOutcome) -> Self {
            Self {
                shutdowns: Arc::new(AtomicUsize::new(0)),
                outcome,
            }
        }
    }

    impl GracefulShutdown for FakeServer {
        async fn shutdown(self, deadline: Duration) -> ShutdownOutcome {
            assert_eq!(deadline, Duration::from_secs(10));
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    #[derive(Clone, Default)]
    struct FakeRespawner {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Respawn for FakeRespawner {
        fn respawn(&self) -> Result<u32, RespawnError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RespawnError::Spawn {
                    path: "/gone".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            } else {
                Ok(4242)
            }
        }
    }

    fn controller(respawner: &FakeRespawner) -> LifecycleController<FakeRespawner> {
        LifecycleController::new(Duration::from_secs(10), Some(respawner.clone()))
    }

    #[tokio::test]
    async fn interrupt_drains_without_respawn() {
        let respawner = FakeRespawner::default();
        let server = FakeServer::new(ShutdownOutcome::clean());
        let (tx, rx) = mpsc::channel(4);
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(controller(&respawner).run(rx, server.clone(), done_tx));
        tx.send(event(2, "interrupt")).await.unwrap();

        let report = done_rx.await.unwrap();
        assert_eq!(report.trigger.name, "interrupt");
        assert!(report.outcome.completed_cleanly);
        assert!(report.respawned.is_none());
        assert_eq!(server.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(respawner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn terminated_drains_without_respawn() {
        let respawner = FakeRespawner::default();
        let (tx, rx) = mpsc::channel(4);
        let (done_tx, done_rx) = oneshot::channel();

        let server = FakeServer::new(ShutdownOutcome::clean());
        tokio::spawn(controller(&respawner).run(rx, server, done_tx));
        tx.send(event(15, "terminated")).await.unwrap();

        let report = done_rx.await.unwrap();
        assert_eq!(report.trigger.class, SignalClass::Terminate);
        assert_eq!(respawner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hangup_respawns_exactly_once_even_after_timeout() {
        let respawner = FakeRespawner::default();
        let server = FakeServer::new(ShutdownOutcome::timed_out(50));
        let (tx, rx) = mpsc::channel(4);
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(controller(&respawner).run(rx, server, done_tx));
        tx.send(HANGUP).await.unwrap();

        let report = done_rx.await.unwrap();
        assert!(report.outcome.timed_out);
        assert_eq!(report.outcome.abandoned, 50);
        assert_eq!(report.respawned.unwrap().unwrap(), 4242);
        assert_eq!(respawner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn respawn_failure_still_completes() {
        let respawner = FakeRespawner {
            fail: true,
            ..Default::default()
        };
        let (tx, rx) = mpsc::channel(4);
        let (done_tx, done_rx) = oneshot::channel();

        let server = FakeServer::new(ShutdownOutcome::clean());
        tokio::spawn(controller(&respawner).run(rx, server, done_tx));
        tx.send(HANGUP).await.unwrap();

        let report = done_rx.await.unwrap();
        assert!(matches!(report.respawned, Some(Err(RespawnError::Spawn { .. }))));
        assert_eq!(respawner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hangup_without_respawner_only_drains() {
        let (tx, rx) = mpsc::channel(4);
        let (done_tx, done_rx) = oneshot::channel();
        let server = FakeServer::new(ShutdownOutcome::clean());

        let controller: LifecycleController<FakeRespawner> =
            LifecycleController::new(Duration::from_secs(10), None);
        tokio::spawn(controller.run(rx, server.clone(), done_tx));
        tx.send(HANGUP).await.unwrap();

        let report = done_rx.await.unwrap();
        assert!(report.respawned.is_none());
        assert_eq!(server.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrecognized_signals_never_shut_down() {
        let respawner = FakeRespawner::default();
        let server = FakeServer::new(ShutdownOutcome::clean());
        let (tx, rx) = mpsc::channel(8);
        let (done_tx, mut done_rx) = oneshot::channel();

        let controller = controller(&respawner);
        let mut state = controller.state();
        tokio::spawn(controller.run(rx, server.clone(), done_tx));

        for (raw, name) in [(10, "user defined signal 1"), (28, "window changed"), (3, "quit")] {
            tx.send(event(raw, name)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(done_rx.try_recv().is_err());
        assert_eq!(server.shutdowns.load(Ordering::SeqCst), 0);
        assert_eq!(*state.borrow_and_update(), ServerState::Serving);

        tx.send(event(15, "terminated")).await.unwrap();
        let report = done_rx.await.unwrap();
        assert_eq!(report.trigger.name, "terminated");
        assert_eq!(*state.borrow_and_update(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn closed_signal_source_drains() {
        let respawner = FakeRespawner::default();
        let server = FakeServer::new(ShutdownOutcome::clean());
        let (tx, rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(controller(&respawner).run(rx, server.clone(), done_tx));
        drop(tx);

        let report = done_rx.await.unwrap();
        assert_eq!(report.trigger.class, SignalClass::Terminate);
        assert_eq!(server.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(respawner.calls.load(Ordering::SeqCst), 0);
    }
}
