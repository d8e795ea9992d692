//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum accept loop, middleware)
//!     → handler.rs (fault boundary → readiness gate → endpoint)
//!     → endpoint.rs (normal response, or error page after a fault)
//!     → Send to client, connection closed
//! ```

pub mod endpoint;
pub mod handler;
pub mod server;

pub use endpoint::{Endpoint, ErrorPage, HandlerFault, ItWorks, PlainErrorPage};
pub use server::{AppState, HttpServer, ServerHandle};
