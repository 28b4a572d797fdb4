//! Responses and handler faults.
//!
//! # Responsibilities
//! - Represent a terminal response (status + JSON body)
//! - Represent a handler fault with its diagnostic trace
//! - Build the generic not-found and internal-error bodies
//!
//! # Design Decisions
//! - Fault detail lives only on `HandlerFault`, never on a `Reply`
//! - The correlation ID is echoed as a response header

use std::backtrace::Backtrace;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::http::request::{CorrelationId, X_CORRELATION_ID};

/// Generic message returned for any internal failure.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// A terminal response produced by exactly one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn not_found(method: &str, url: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            json!({
                "error": "Not Found",
                "message": format!("The route {method} {url} does not exist"),
            }),
        )
    }

    pub fn internal_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": "Internal Server Error",
                "message": GENERIC_ERROR_MESSAGE,
            }),
        )
    }

    /// Convert into an HTTP response, tagging it with the correlation ID.
    pub fn into_response_with(self, correlation_id: Option<&CorrelationId>) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(id) = correlation_id {
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                response.headers_mut().insert(X_CORRELATION_ID, value);
            }
        }
        response
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}

/// An unexpected condition that aborted a handler.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct HandlerFault {
    kind: &'static str,
    message: String,
    trace: String,
}

impl HandlerFault {
    /// Raise a fault, capturing the current backtrace.
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Backtrace::force_capture().to_string(),
        }
    }

    /// Fault built from a caught handler panic.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        Self::new("Panic", message)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }
}
