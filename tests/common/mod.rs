//! Shared helpers for integration tests.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use correlated_sample_app::config::AppConfig;
use correlated_sample_app::observability::{LogSink, MemorySink, StructuredLogger};
use correlated_sample_app::HttpServer;
use serde_json::Value;
use tower::ServiceExt; // .oneshot()

/// Router wired to an in-memory sink.
pub struct TestApp {
    pub router: Router,
    pub sink: Arc<MemorySink>,
}

#[allow(dead_code)]
pub fn test_app() -> TestApp {
    test_app_with(AppConfig::default())
}

pub fn test_app_with(config: AppConfig) -> TestApp {
    let sink = Arc::new(MemorySink::new());
    let server = HttpServer::new(config, StructuredLogger::new(sink.clone()));
    TestApp {
        router: server.router(),
        sink,
    }
}

/// Router whose logger writes to `sink`; nothing is captured.
#[allow(dead_code)]
pub fn app_with_sink(sink: Arc<dyn LogSink>) -> Router {
    HttpServer::new(AppConfig::default(), StructuredLogger::new(sink)).router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn correlation_id(&self) -> String {
        self.headers
            .get("x-correlation-id")
            .expect("x-correlation-id header")
            .to_str()
            .unwrap()
            .to_string()
    }
}

pub async fn send(router: &Router, method: Method, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("user-agent", "integration-test")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

#[allow(dead_code)]
pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri).await
}
