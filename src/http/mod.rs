//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info, tracing layer)
//!     → pipeline (correlation → dispatch → not found → error fallback)
//!     → handlers.rs (sample endpoints)
//!     → response.rs (JSON body, x-correlation-id header)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CorrelationId, RequestContext, X_CORRELATION_ID};
pub use response::{HandlerFault, Reply};
pub use server::HttpServer;
