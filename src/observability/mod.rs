//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages and route handlers produce:
//!     → logger.rs (StructuredLogger / RequestLogger, builds LogRecord)
//!     → sink.rs (stdout JSON lines, tracing events, in-memory for tests)
//!
//! Process internals produce:
//!     → tracing events (startup, phase transitions, sink failures)
//!     → logging.rs (tracing-subscriber, EnvFilter, plain or JSON)
//! ```
//!
//! # Design Decisions
//! - The structured logger is an explicit instance, injected into the pipeline
//! - Correlation ID flows through every request-scoped record
//! - Logging is best-effort: a broken sink never fails a request

pub mod logger;
pub mod logging;
pub mod sink;

pub use logger::{Fields, Level, LogRecord, RequestLogger, StructuredLogger};
pub use sink::{JsonLinesSink, LogSink, MemorySink, SinkError, TracingSink};

/// Build a [`Fields`] map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works.
#[macro_export]
macro_rules! fields {
    () => {
        $crate::observability::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::observability::Fields::new();
        $( map.insert(::std::string::String::from($key), ::serde_json::json!($value)); )+
        map
    }};
}
