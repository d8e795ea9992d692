//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! --config PATH / GATED_SERVER_CONFIG
//!     → loader.rs parses TOML into ServerConfig
//!     → validation.rs checks semantics
//!     → ServerConfig (validated, immutable)
//!     → handed by value to the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a reload is a fresh process (SIGHUP re-exec)
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ReloadConfig, ServerConfig, ShutdownConfig,
    StartupConfig,
};
pub use validation::{validate_config, ValidationError};
