//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file named by APP_CONFIG (loader.rs)
//!     → environment overrides: PORT, APP_ENV, APP_NAME, LOG_LEVEL,
//!       LOG_FORMAT, LOG_SINK, DATA_MAX_DELAY_MS (loader.rs)
//!     → validation.rs (semantic checks, all errors reported)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload
//! - All fields have defaults to allow an empty environment
//! - Validation separates syntactic (serde / parse) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{from_env, load_config, load_with, ConfigError};
pub use schema::{AppConfig, DataConfig, ListenerConfig, ObservabilityConfig, ServiceConfig, SinkKind};
pub use validation::{validate_config, ValidationError};
