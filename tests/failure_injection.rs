//! Outbound failures must not change endpoint responses.

use telemetry_sample_app::http::TraceResponse;
use telemetry_sample_app::signals::TOTAL_API_REQUESTS;

mod common;

#[tokio::test]
async fn test_upstream_error_status_still_succeeds() {
    let upstream = common::start_mock_upstream("503 Service Unavailable", "down").await;
    let app = common::spawn_app(common::test_config(&upstream)).await;

    let res = common::client().get(app.url("/outgoing-http-call")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(upstream.hits(), 1);
    assert_eq!(app.sink.observe(TOTAL_API_REQUESTS), Some(1));

    app.stop().await;
}

#[tokio::test]
async fn test_unreachable_upstream_still_succeeds() {
    let upstream = common::start_mock_upstream("200 OK", "unused").await;
    let mut config = common::test_config(&upstream);
    // Nothing listens on port 1.
    config.outbound.upstream_url = "http://127.0.0.1:1/".into();
    let app = common::spawn_app(config).await;

    let res = common::client().get(app.url("/outgoing-http-call")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: TraceResponse = res.json().await.unwrap();
    assert!(common::is_xray_trace_id(&body.trace_id));
    assert_eq!(app.sink.observe(TOTAL_API_REQUESTS), Some(1));

    app.stop().await;
}

#[tokio::test]
async fn test_unreachable_database_still_succeeds() {
    let upstream = common::start_mock_upstream("200 OK", "upstream").await;
    let app = common::spawn_app(common::test_config(&upstream)).await;

    let res = common::client().get(app.url("/outgoing-psql-call")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    // The upstream call still happens after the failed SQL probes.
    assert_eq!(upstream.hits(), 1);
    assert_eq!(app.sink.observe(TOTAL_API_REQUESTS), Some(1));

    app.stop().await;
}

#[tokio::test]
async fn test_unreachable_sibling_still_succeeds() {
    let upstream = common::start_mock_upstream("200 OK", "upstream").await;
    let mut config = common::test_config(&upstream);
    config.outbound.sample_app_ports = vec![1];
    let app = common::spawn_app(config).await;

    let res = common::client().get(app.url("/outgoing-sampleapp")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(upstream.hits(), 0);

    app.stop().await;
}

#[tokio::test]
async fn test_unreachable_database_with_many_queries_answers_before_request_timeout() {
    let upstream = common::start_mock_upstream("200 OK", "upstream").await;
    let mut config = common::test_config(&upstream);
    config.database.query_count = 10;
    config.database.acquire_timeout_secs = 1;
    config.database.probe_timeout_secs = 2;
    config.outbound.timeout_secs = 1;
    config.listener.request_timeout_secs = 4;
    let app = common::spawn_app(config).await;

    let res = common::client().get(app.url("/outgoing-psql-call")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: TraceResponse = res.json().await.unwrap();
    assert!(common::is_xray_trace_id(&body.trace_id));
    assert_eq!(upstream.hits(), 1);
    assert_eq!(app.sink.observe(TOTAL_API_REQUESTS), Some(1));

    app.stop().await;
}
