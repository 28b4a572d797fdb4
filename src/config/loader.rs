//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Names a TOML file to start from.
pub const CONFIG_PATH_VAR: &str = "APP_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration from the process environment.
pub fn from_env() -> Result<AppConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Defaults, then the optional file named by `APP_CONFIG`, then env overrides.
pub fn load_with<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_VAR) {
        Some(path) => read_file(Path::new(&path))?,
        None => AppConfig::default(),
    };

    let mut errors = apply_env_overrides(&mut config, &lookup);
    if let Err(mut semantic) = validate_config(&config) {
        errors.append(&mut semantic);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply `PORT`, `APP_ENV` and friends. Returns values that failed to parse.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: &F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(port) = parse_var(lookup, "PORT", &mut errors) {
        config.listener.port = port;
    }
    if let Some(env) = lookup("APP_ENV") {
        config.service.environment = env;
    }
    if let Some(name) = lookup("APP_NAME") {
        config.service.name = name;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        match format.trim().to_ascii_lowercase().as_str() {
            "json" => config.observability.json = true,
            "plain" | "text" => config.observability.json = false,
            _ => errors.push(ValidationError::InvalidEnv {
                var: "LOG_FORMAT",
                value: format,
                reason: "expected json or plain".to_string(),
            }),
        }
    }
    if let Some(sink) = parse_var(lookup, "LOG_SINK", &mut errors) {
        config.observability.sink = sink;
    }
    if let Some(delay) = parse_var(lookup, "DATA_MAX_DELAY_MS", &mut errors) {
        config.data.max_delay_ms = delay;
    }

    errors
}

fn parse_var<F, T>(lookup: &F, var: &'static str, errors: &mut Vec<ValidationError>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    let value = lookup(var)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.push(ValidationError::InvalidEnv {
                var,
                value,
                reason: e.to_string(),
            });
            None
        }
    }
}
