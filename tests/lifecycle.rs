//! Startup and shutdown behavior of the assembled app.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use telemetry_sample_app::observability::metrics::{MemorySink, MetricSink};
use telemetry_sample_app::signals::SettingsError;
use telemetry_sample_app::{App, AppError, Shutdown};

mod common;

#[tokio::test]
async fn test_serve_returns_when_shutdown_triggered_earlier() {
    let upstream = common::start_mock_upstream("200 OK", "upstream").await;
    let sink: Arc<dyn MetricSink> = Arc::new(MemorySink::new());
    let app = App::build(common::test_config(&upstream), sink, None).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let shutdown = Shutdown::new();
    shutdown.trigger();

    tokio::time::timeout(Duration::from_secs(3), app.serve(listener, shutdown))
        .await
        .expect("serve ignored an earlier shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_build_rejects_zero_generator_interval() {
    let upstream = common::start_mock_upstream("200 OK", "upstream").await;
    let mut config = common::test_config(&upstream);
    config.generator.time_interval_secs = 0;
    let sink: Arc<dyn MetricSink> = Arc::new(MemorySink::new());

    match App::build(config, sink, None) {
        Err(AppError::Generator(SettingsError::ZeroInterval)) => {}
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("zero interval accepted"),
    }
}
