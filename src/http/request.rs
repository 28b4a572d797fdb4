//! Per-request context and correlation IDs.
//!
//! # Responsibilities
//! - Generate a unique correlation ID (UUID v4) per request
//! - Capture method, url, client address and user agent once
//! - Expose the context to every later stage without regeneration
//!
//! # Design Decisions
//! - Correlation ID assigned as early as possible, immutable afterwards
//! - Context shared via `Arc`, dropped with the response

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderName, Method, Request};
use serde_json::Value;
use uuid::Uuid;

use crate::fields;
use crate::observability::Fields;

/// Response header echoing the correlation ID.
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Opaque per-request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the pipeline knows about the inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub method: Method,
    pub url: String,
    pub client_address: Option<SocketAddr>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Capture the context for `request`, assigning a fresh correlation ID.
    pub fn capture(request: &Request<Body>) -> Self {
        let url = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        let client_address = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            correlation_id: CorrelationId::generate(),
            method: request.method().clone(),
            url,
            client_address,
            user_agent,
        }
    }

    pub fn client_address_value(&self) -> Value {
        self.client_address
            .map(|addr| Value::String(addr.ip().to_string()))
            .unwrap_or(Value::Null)
    }

    /// Fields describing the request, for the "received" and not-found records.
    pub fn request_fields(&self) -> Fields {
        fields! {
            "method" => self.method.as_str(),
            "url" => self.url,
            "clientAddress" => self.client_address_value(),
            "userAgent" => self.user_agent,
        }
    }
}
