//! Structured log records and the logger that emits them.
//!
//! # Responsibilities
//! - Build immutable `LogRecord`s (level, message, fields, timestamp)
//! - Hand each record to the configured sink exactly once
//! - Bind a correlation ID to every record of a request (`RequestLogger`)
//!
//! # Design Decisions
//! - Fields are a key-ordered map so rendering is deterministic
//! - Emission never fails: sink errors and panics are swallowed and counted
//! - Reserved keys in fields are renamed on output, never dropped

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::request::CorrelationId;
use crate::observability::sink::LogSink;

/// Structured fields attached to a record.
pub type Fields = BTreeMap<String, Value>;

/// Field name carrying the correlation ID.
pub const CORRELATION_FIELD: &str = "correlationId";

const RESERVED_KEYS: [&str; 3] = ["timestamp", "level", "message"];

/// Record severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured log entry. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    level: Level,
    message: String,
    fields: Fields,
    timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Build a record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>, fields: Fields) -> Self {
        Self::at(level, message, fields, Utc::now())
    }

    /// Build a record with a caller-supplied timestamp.
    pub fn at(
        level: Level,
        message: impl Into<String>,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            fields,
            timestamp,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Correlation ID carried by this record, if any.
    pub fn correlation_id(&self) -> Option<&str> {
        self.field(CORRELATION_FIELD).and_then(Value::as_str)
    }

    /// Render as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl LogRecord {
    /// Output key for a reserved field: `fields.<key>`, prefixed again until
    /// it collides with no caller-supplied key.
    fn renamed_key(&self, key: &str) -> String {
        let mut renamed = format!("fields.{key}");
        while self.fields.contains_key(&renamed) {
            renamed.insert_str(0, "fields.");
        }
        renamed
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        map.serialize_entry(
            "timestamp",
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("message", &self.message)?;
        for (key, value) in &self.fields {
            if RESERVED_KEYS.contains(&key.as_str()) {
                map.serialize_entry(&self.renamed_key(key), value)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Process-wide structured logger. Cheap to clone; all clones share one sink.
#[derive(Clone)]
pub struct StructuredLogger {
    sink: Arc<dyn LogSink>,
    dropped: Arc<AtomicU64>,
}

impl StructuredLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn info(&self, message: impl Into<String>, fields: Fields) {
        self.emit(LogRecord::new(Level::Info, message, fields));
    }

    pub fn warn(&self, message: impl Into<String>, fields: Fields) {
        self.emit(LogRecord::new(Level::Warn, message, fields));
    }

    pub fn error(&self, message: impl Into<String>, fields: Fields) {
        self.emit(LogRecord::new(Level::Error, message, fields));
    }

    /// Write a prepared record. Never fails and never panics.
    pub fn emit(&self, record: LogRecord) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.sink.write(&record)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(error = %e, record = %record.message(), "Log sink rejected record");
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(record = %record.message(), "Log sink panicked");
            }
        }
    }

    /// Number of records the sink failed to accept.
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Logger bound to a single request's correlation ID.
    pub fn for_request(&self, correlation_id: &CorrelationId) -> RequestLogger {
        RequestLogger {
            inner: self.clone(),
            correlation_id: correlation_id.clone(),
        }
    }
}

impl fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("dropped", &self.dropped_records())
            .finish_non_exhaustive()
    }
}

/// Request-scoped logger: stamps the correlation ID on every record.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    inner: StructuredLogger,
    correlation_id: CorrelationId,
}

impl RequestLogger {
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn info(&self, message: impl Into<String>, fields: Fields) {
        self.log(Level::Info, message, fields);
    }

    pub fn warn(&self, message: impl Into<String>, fields: Fields) {
        self.log(Level::Warn, message, fields);
    }

    pub fn error(&self, message: impl Into<String>, fields: Fields) {
        self.log(Level::Error, message, fields);
    }

    pub fn log(&self, level: Level, message: impl Into<String>, mut fields: Fields) {
        fields.insert(
            CORRELATION_FIELD.to_string(),
            Value::String(self.correlation_id.to_string()),
        );
        self.inner.emit(LogRecord::new(level, message, fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::observability::sink::{MemorySink, SinkError};
    use chrono::TimeZone;

    struct FailingSink;

    impl LogSink for FailingSink {
        fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("closed".into()))
        }
    }

    struct PanickingSink;

    impl LogSink for PanickingSink {
        fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
            panic!("sink exploded");
        }
    }

    #[test]
    fn test_record_renders_fields_in_key_order() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let record = LogRecord::at(
            Level::Warn,
            "Deprecated endpoint accessed",
            fields! { "zeta" => 1, "alpha" => "a" },
            ts,
        );
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"timestamp":"2024-01-02T03:04:05.000Z","level":"warn","message":"Deprecated endpoint accessed","alpha":"a","zeta":1}"#
        );
    }

    #[test]
    fn test_reserved_keys_are_kept_under_prefix() {
        let record = LogRecord::new(Level::Info, "hello", fields! { "level" => "custom" });
        let line: Value = serde_json::from_str(&record.to_json_line().unwrap()).unwrap();
        assert_eq!(line["level"], "info");
        assert_eq!(line["fields.level"], "custom");
    }

    #[test]
    fn test_renamed_key_does_not_collide_with_literal_key() {
        let record = LogRecord::new(
            Level::Info,
            "hello",
            fields! { "level" => "custom", "fields.level" => "literal" },
        );
        let line = record.to_json_line().unwrap();
        let parsed: serde_json::Map<String, Value> = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["fields.level"], "literal");
        assert_eq!(parsed["fields.fields.level"], "custom");
        assert_eq!(line.matches(r#""fields.level":"#).count(), 1);
    }

    #[test]
    fn test_nested_values_survive_rendering() {
        let record = LogRecord::new(
            Level::Info,
            "nested",
            fields! { "payload" => serde_json::json!({ "a": [1, 2, { "b": null }] }) },
        );
        let line: Value = serde_json::from_str(&record.to_json_line().unwrap()).unwrap();
        assert_eq!(line["payload"], serde_json::json!({ "a": [1, 2, { "b": null }] }));
    }

    #[test]
    fn test_timestamp_attached_automatically() {
        let before = Utc::now();
        let record = LogRecord::new(Level::Info, "now", fields!());
        assert!(record.timestamp() >= before);
        assert!(record.timestamp() <= Utc::now());
    }

    #[test]
    fn test_sink_failures_are_swallowed() {
        let logger = StructuredLogger::new(Arc::new(FailingSink));
        logger.error("first", fields!());
        logger.info("second", fields!());
        assert_eq!(logger.dropped_records(), 2);
    }

    #[test]
    fn test_sink_panic_is_contained() {
        let logger = StructuredLogger::new(Arc::new(PanickingSink));
        logger.warn("boom", fields!());
        assert_eq!(logger.dropped_records(), 1);
    }

    #[test]
    fn test_request_logger_stamps_correlation_id() {
        let sink = Arc::new(MemorySink::new());
        let logger = StructuredLogger::new(sink.clone());
        let id = CorrelationId::generate();
        let scoped = logger.for_request(&id);

        scoped.info("one", fields! { "endpoint" => "/health" });
        scoped.warn("two", fields!());

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message(), "one");
        assert_eq!(records[1].message(), "two");
        for record in &records {
            assert_eq!(record.correlation_id(), Some(id.as_str()));
        }
    }
}
