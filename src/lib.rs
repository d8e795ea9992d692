//! Gated HTTP server.
//!
//! A minimal HTTP server that holds every request until a one-time
//! initialization routine finishes, and drains gracefully on OS signals.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ http::server ──▶ http::handler ──▶ lifecycle::gate
//!                                                       │                 (await_ready)
//!                                                       ▼
//!                                                 http::endpoint
//!
//!   OS signals ──▶ lifecycle::signals ──▶ lifecycle::controller ──▶ ServerHandle::shutdown
//!                                                 │
//!                                                 └──▶ lifecycle::respawn (hangup only)
//! ```
//!
//! Cross-cutting: `config` (TOML), `observability` (tracing, metrics).

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
