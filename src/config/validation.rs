//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and known names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: AppConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::AppConfig;

pub const MAX_DELAY_LIMIT_MS: u64 = 60_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("listener.host must not be empty")]
    EmptyHost,
    #[error("service.name must not be empty")]
    EmptyServiceName,
    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
    #[error("data.max_delay_ms must be between 1 and {max}, got {0}", max = MAX_DELAY_LIMIT_MS)]
    DelayOutOfRange(u64),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if !(1..=MAX_DELAY_LIMIT_MS).contains(&config.data.max_delay_ms) {
        errors.push(ValidationError::DelayOutOfRange(config.data.max_delay_ms));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
