//! Process diagnostics via `tracing`.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick the structured-record sink from configuration
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Diagnostics go to stderr so stdout carries only JSON records

use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ObservabilityConfig, SinkKind};
use crate::observability::sink::{JsonLinesSink, LogSink, TracingSink};

/// Build the default filter directive for the configured level.
pub fn default_directive(level: &str) -> String {
    format!("correlated_sample_app={level},structured={level},tower_http=debug")
}

/// Install the global tracing subscriber.
///
/// Returns an error if a subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

/// Sink for structured request records.
pub fn build_sink(kind: SinkKind) -> Arc<dyn LogSink> {
    match kind {
        SinkKind::Stdout => Arc::new(JsonLinesSink::stdout()),
        SinkKind::Tracing => Arc::new(TracingSink),
    }
}
