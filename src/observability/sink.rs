//! Log record sinks.
//!
//! # Responsibilities
//! - Serialize records to their destination
//! - Keep each record whole under interleaved writers
//!
//! # Design Decisions
//! - One trait, three sinks: JSON lines, tracing events, memory
//! - Writers are guarded by a mutex held for exactly one record

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::observability::logger::{Level, LogRecord};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for structured log records.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Writes one JSON object per line to any `Write`.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> LogSink for JsonLinesSink<W> {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut line = record.to_json_line()?;
        line.push('\n');
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Unavailable("writer lock poisoned".into()))?;
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Re-emits records as `tracing` events under the `structured` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let fields = serde_json::to_string(record.fields())?;
        let correlation_id = record.correlation_id().unwrap_or("-");
        match record.level() {
            Level::Info => tracing::info!(
                target: "structured",
                correlation_id,
                fields = %fields,
                "{}",
                record.message()
            ),
            Level::Warn => tracing::warn!(
                target: "structured",
                correlation_id,
                fields = %fields,
                "{}",
                record.message()
            ),
            Level::Error => tracing::error!(
                target: "structured",
                correlation_id,
                fields = %fields,
                "{}",
                record.message()
            ),
        }
        Ok(())
    }
}

/// Keeps records in memory. Used by tests to inspect what was logged.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, in write order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records carrying the given correlation ID.
    pub fn for_correlation(&self, correlation_id: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.correlation_id() == Some(correlation_id))
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}
