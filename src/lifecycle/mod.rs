//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (gate.rs, startup.rs):
//!     Gate created held → initialization task runs concurrently with the listener
//!     → guard dropped → gate opens for good
//!
//! Signals (signals.rs):
//!     every handleable signal → classified → controller channel
//!
//! Shutdown (controller.rs, shutdown.rs, respawn.rs):
//!     hangup/interrupt/terminated → stop accepting → drain (10s bound)
//!     → hangup only: start a fresh instance → report to main → exit
//! ```
//!
//! # Design Decisions
//! - The gate is a one-shot latch; no handler proceeds before the guard drops
//! - Shutdown has a deadline: requests still running after it are abandoned
//! - Nothing on the shutdown path can stop the process from exiting

pub mod controller;
pub mod gate;
pub mod respawn;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{LifecycleController, LifecycleReport, ServerState};
pub use gate::{InitGuard, ReadinessGate};
pub use respawn::{ProcessRespawner, Respawn, RespawnError};
pub use shutdown::{GracefulShutdown, Shutdown, ShutdownOutcome};
pub use signals::{classify, SignalClass, SignalEvent};
pub use startup::{spawn_initialization, StartupError};
