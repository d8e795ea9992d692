//! Startup orchestration.
//!
//! # Responsibilities
//! - Run the one-time initialization routine concurrently with the listener
//! - Release the readiness gate however the routine ends
//!
//! # Design Decisions
//! - The listener starts accepting before initialization finishes; requests
//!   queue on the gate instead of being refused
//! - Initialization failure is logged, not fatal: the gate opens regardless
//!   and handlers serve whatever the routine managed to set up

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::StartupConfig;
use crate::lifecycle::gate::InitGuard;

/// Failure reported by an initialization routine.
#[derive(Debug, Error)]
#[error("initialization step `{step}` failed: {reason}")]
pub struct StartupError {
    pub step: &'static str,
    pub reason: String,
}

/// Run `routine` on its own task, ending the exclusive phase when it returns,
/// fails or panics.
pub fn spawn_initialization<F, Fut>(guard: InitGuard, routine: F) -> JoinHandle<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), StartupError>> + Send + 'static,
{
    // `guard` is owned by the task, so it is dropped even if `routine` unwinds.
    tokio::spawn(async move {
        tracing::info!("Initialization started");

        match routine().await {
            Ok(()) => tracing::debug!("Initialization routine succeeded"),
            Err(e) => tracing::error!(error = %e, "Initialization routine failed"),
        }

        guard.end_init();
    })
}

/// Default initialization routine: the warm-up delay from configuration.
///
/// Stands in for external collaborators such as database pools and template
/// compilation, which may take arbitrarily long.
pub async fn warm_up(config: StartupConfig) -> Result<(), StartupError> {
    if config.warmup_ms > 0 {
        tracing::info!(warmup_ms = config.warmup_ms, "Warming up");
        tokio::time::sleep(Duration::from_millis(config.warmup_ms)).await;
    }
    Ok(())
}
