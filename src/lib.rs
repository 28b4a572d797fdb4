//! Correlated structured logging sample service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ axum::serve ──▶ TraceLayer ──▶ Pipeline
//!                                                    │
//!                      ┌─────────────────────────────┘
//!                      ▼
//!          ┌───────────────────┐   "Request received"
//!          │ CorrelationStage  │──────────────────────┐
//!          └─────────┬─────────┘                      │
//!                    ▼                                │
//!          ┌───────────────────┐   handler records    │
//!          │  DispatchStage    │──────────────────────┤
//!          │  (RouteTable)     │                      ▼
//!          └─────────┬─────────┘             ┌──────────────────┐
//!                    ▼                       │ StructuredLogger │
//!          ┌───────────────────┐  warn       │  → LogSink       │
//!          │  NotFoundStage    │────────────▶│  (stdout/tracing)│
//!          └─────────┬─────────┘             └──────────────────┘
//!                    ▼                                ▲
//!          ┌───────────────────┐  error + stack       │
//!          │ErrorFallbackStage │──────────────────────┘
//!          └───────────────────┘
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::StructuredLogger;
pub use pipeline::Pipeline;
