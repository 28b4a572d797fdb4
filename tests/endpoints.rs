//! Endpoint behaviour and logging, driven through the in-memory router.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use correlated_sample_app::config::AppConfig;
use correlated_sample_app::observability::{Level, LogRecord, LogSink, SinkError};
use futures_util::future::join_all;
use serde_json::json;

mod common;

use common::{app_with_sink, get, send, test_app, test_app_with};

fn messages(records: &[LogRecord]) -> Vec<&str> {
    records.iter().map(|r| r.message()).collect()
}

#[tokio::test]
async fn health_returns_ok_with_timestamp() {
    let app = test_app();
    let res = get(&app.router, "/health").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "OK");
    assert_eq!(res.body["service"], "sample-app");
    let ts = res.body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());

    let records = app.sink.for_correlation(&res.correlation_id());
    assert_eq!(
        messages(&records),
        vec!["Request received", "Health check requested"]
    );
    assert!(records.iter().all(|r| r.level() == Level::Info));
    assert_eq!(records[0].field("method").unwrap(), "GET");
    assert_eq!(records[0].field("url").unwrap(), "/health");
    assert_eq!(records[0].field("userAgent").unwrap(), "integration-test");
}

#[tokio::test(start_paused = true)]
async fn data_reports_its_own_response_time() {
    let app = test_app();
    let res = get(&app.router, "/api/data").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Data retrieved successfully");
    let response_time = res.body["responseTime"].as_u64().unwrap();
    assert!(response_time < 100);

    let records = app.sink.for_correlation(&res.correlation_id());
    let data_records: Vec<_> = records
        .iter()
        .filter(|r| r.message() == "Data retrieved successfully")
        .collect();
    assert_eq!(data_records.len(), 1);
    assert_eq!(data_records[0].level(), Level::Info);
    assert_eq!(
        data_records[0].field("responseTime").unwrap(),
        &json!(response_time)
    );
}

#[tokio::test(start_paused = true)]
async fn data_delay_respects_configured_bound() {
    let mut config = AppConfig::default();
    config.data.max_delay_ms = 3;
    let app = test_app_with(config);

    for _ in 0..20 {
        let res = get(&app.router, "/api/data").await;
        assert!(res.body["responseTime"].as_u64().unwrap() < 3);
    }
}

#[tokio::test]
async fn data_stays_below_bound_on_real_clock() {
    let mut config = AppConfig::default();
    config.data.max_delay_ms = 2;
    let app = test_app_with(config);

    for _ in 0..50 {
        let res = get(&app.router, "/api/data").await;
        let response_time = res.body["responseTime"].as_u64().unwrap();
        assert!(response_time < 2, "responseTime {response_time} reached the bound");

        let records = app.sink.for_correlation(&res.correlation_id());
        let logged = records
            .iter()
            .find(|r| r.message() == "Data retrieved successfully")
            .unwrap();
        assert_eq!(logged.field("responseTime").unwrap(), &json!(response_time));
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_data_requests_stay_independent() {
    let app = test_app();
    let responses = join_all((0..25).map(|_| get(&app.router, "/api/data"))).await;

    let mut ids = HashSet::new();
    for res in &responses {
        assert_eq!(res.status, StatusCode::OK);
        let id = res.correlation_id();
        assert!(ids.insert(id.clone()));

        let records = app.sink.for_correlation(&id);
        let logged: Vec<_> = records
            .iter()
            .filter_map(|r| r.field("responseTime"))
            .collect();
        assert_eq!(logged, vec![&res.body["responseTime"]]);
    }
}

#[tokio::test]
async fn warning_is_advisory() {
    let app = test_app();
    let res = get(&app.router, "/api/warning").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["warning"], true);
    assert_eq!(
        res.body["message"],
        "This endpoint is deprecated. Please use /api/data instead."
    );

    let records = app.sink.for_correlation(&res.correlation_id());
    let warns: Vec<_> = records.iter().filter(|r| r.level() == Level::Warn).collect();
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0].message(), "Deprecated endpoint accessed");
    assert_eq!(
        warns[0].field("recommendation").unwrap(),
        "Use /api/data instead"
    );
}

#[tokio::test]
async fn error_hides_details_from_the_caller() {
    let app = test_app();
    let res = get(&app.router, "/api/error").await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.body,
        json!({
            "error": "Internal Server Error",
            "message": "An unexpected error occurred",
        })
    );

    let records = app.sink.for_correlation(&res.correlation_id());
    assert_eq!(
        messages(&records),
        vec![
            "Request received",
            "Internal server error occurred",
            "Unhandled error in application"
        ]
    );

    let body_text = res.body.to_string();
    for record in records.iter().skip(1) {
        assert_eq!(record.level(), Level::Error);
        assert_eq!(
            record.field("error").unwrap(),
            "Simulated internal server error"
        );
        let stack = record.field("stack").and_then(|v| v.as_str()).unwrap();
        assert!(!stack.is_empty());
        assert!(!body_text.contains(stack));
    }
    assert!(!body_text.contains("Simulated internal server error"));
}

#[tokio::test]
async fn critical_failure_is_handled_in_place() {
    let app = test_app();
    let res = get(&app.router, "/api/critical").await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["error"], "Critical System Failure");
    assert!(res.body["timestamp"].is_string());

    let records = app.sink.for_correlation(&res.correlation_id());
    assert_eq!(
        messages(&records),
        vec!["Request received", "Critical system failure occurred"]
    );
    assert_eq!(records[1].field("severity").unwrap(), "critical");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = test_app();

    let res = get(&app.router, "/does-not-exist").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Not Found");
    assert_eq!(
        res.body["message"],
        "The route GET /does-not-exist does not exist"
    );

    let records = app.sink.for_correlation(&res.correlation_id());
    let last = records.last().unwrap();
    assert_eq!(last.level(), Level::Warn);
    assert_eq!(last.message(), "Route not found");
    assert_eq!(last.field("url").unwrap(), "/does-not-exist");

    let res = send(&app.router, Method::POST, "/health").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "The route POST /health does not exist");

    let res = send(&app.router, Method::DELETE, "/api/data?force=1").await;
    assert_eq!(
        res.body["message"],
        "The route DELETE /api/data?force=1 does not exist"
    );
}

#[tokio::test]
async fn correlation_ids_are_unique_and_consistent() {
    let app = test_app();
    let mut seen = HashSet::new();

    for uri in ["/health", "/api/warning", "/api/error", "/missing", "/health"] {
        let res = get(&app.router, uri).await;
        let id = res.correlation_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert!(seen.insert(id.clone()), "correlation id reused");

        let records = app.sink.for_correlation(&id);
        assert!(!records.is_empty());
        assert_eq!(records[0].message(), "Request received");
    }

    // every record belongs to exactly one request
    let all = app.sink.records();
    assert!(all
        .iter()
        .all(|r| r.correlation_id().is_some_and(|id| seen.contains(id))));
}

struct BrokenSink;

impl LogSink for BrokenSink {
    fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("disk full".into()))
    }
}

#[tokio::test]
async fn broken_sink_never_changes_responses() {
    let router = app_with_sink(Arc::new(BrokenSink));

    let res = get(&router, "/health").await;
    assert_eq!(res.status, StatusCode::OK);

    let res = get(&router, "/api/error").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["message"], "An unexpected error occurred");

    let res = get(&router, "/nope").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
