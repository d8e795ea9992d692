//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind configured address; failure is fatal)
//!     → Hand off to HTTP layer (axum accept loop)
//!
//! Per request:
//!     → connection.rs (in-flight guard held until the response is produced)
//! ```
//!
//! # Design Decisions
//! - No connection limit: requests blocked on the readiness gate must stay queued, not refused
//! - In-flight count tells a timed-out drain how many requests it abandons

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker};
pub use listener::ListenerError;
