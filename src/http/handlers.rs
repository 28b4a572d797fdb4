//! Sample endpoints.
//!
//! Each handler logs through its request-scoped logger and answers with a
//! canned JSON body. `/api/error` faults on purpose so the error fallback
//! produces the response.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::json;

use crate::config::AppConfig;
use crate::fields;
use crate::http::response::{HandlerFault, Reply};
use crate::routing::{RequestScope, RouteTable};

/// Static settings handlers read from their scope.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub service_name: String,
    /// Exclusive upper bound of the simulated `/api/data` delay.
    pub max_delay: Duration,
}

impl HandlerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            service_name: config.service.name.clone(),
            max_delay: Duration::from_millis(config.data.max_delay_ms),
        }
    }
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Register every sample endpoint.
pub fn route_table() -> RouteTable {
    RouteTable::new()
        .route(Method::GET, "/health", "health", health)
        .route(Method::GET, "/api/data", "data", data)
        .route(Method::GET, "/api/warning", "warning", warning)
        .route(Method::GET, "/api/error", "error", error)
        .route(Method::GET, "/api/critical", "critical", critical)
}

/// Current time as RFC 3339 with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn max_millis(max: Duration) -> u64 {
    u64::try_from(max.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn random_delay(max: Duration) -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..max_millis(max)))
}

/// Measured elapsed time in whole ms, capped just below `max`.
///
/// Timer granularity rounds sleeps up, so a draw near the bound can measure
/// at or past it.
fn bounded_response_time(elapsed: Duration, max: Duration) -> u64 {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    elapsed_ms.min(max_millis(max) - 1)
}

pub async fn health(scope: RequestScope) -> Result<Reply, HandlerFault> {
    scope.log.info("Health check requested", fields! { "endpoint" => "/health" });
    Ok(Reply::ok(json!({
        "status": "OK",
        "service": scope.settings.service_name,
        "timestamp": now_timestamp(),
    })))
}

pub async fn data(scope: RequestScope) -> Result<Reply, HandlerFault> {
    let delay = random_delay(scope.settings.max_delay);
    let start = tokio::time::Instant::now();
    tokio::time::sleep(delay).await;
    let response_time = bounded_response_time(start.elapsed(), scope.settings.max_delay);

    scope.log.info(
        "Data retrieved successfully",
        fields! {
            "responseTime" => response_time,
            "endpoint" => "/api/data",
        },
    );

    Ok(Reply::ok(json!({
        "message": "Data retrieved successfully",
        "timestamp": now_timestamp(),
        "responseTime": response_time,
    })))
}

/// Deprecated but still served: the warning is advisory, so the status stays 200.
pub async fn warning(scope: RequestScope) -> Result<Reply, HandlerFault> {
    scope.log.warn(
        "Deprecated endpoint accessed",
        fields! {
            "endpoint" => "/api/warning",
            "recommendation" => "Use /api/data instead",
        },
    );
    Ok(Reply::ok(json!({
        "message": "This endpoint is deprecated. Please use /api/data instead.",
        "warning": true,
    })))
}

pub async fn error(scope: RequestScope) -> Result<Reply, HandlerFault> {
    let fault = HandlerFault::new("Error", "Simulated internal server error");
    scope.log.error(
        "Internal server error occurred",
        fields! {
            "errorType" => fault.kind(),
            "error" => fault.message(),
            "stack" => fault.trace(),
            "endpoint" => "/api/error",
        },
    );
    Err(fault)
}

/// A failure the handler deals with itself, so no fault reaches the pipeline.
pub async fn critical(scope: RequestScope) -> Result<Reply, HandlerFault> {
    scope.log.error(
        "Critical system failure occurred",
        fields! {
            "severity" => "critical",
            "errorType" => "SystemFailure",
            "error" => "Simulated critical system failure",
            "endpoint" => "/api/critical",
        },
    );
    Ok(Reply::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "error": "Critical System Failure",
            "message": "The system encountered a critical failure",
            "timestamp": now_timestamp(),
        }),
    ))
}
