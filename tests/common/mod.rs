//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use telemetry_sample_app::observability::metrics::{MemorySink, MetricSink, PrometheusSink};
use telemetry_sample_app::{App, AppConfig, Shutdown};

/// A mock upstream that answers every request with a fixed body.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_mock_upstream(status: &'static str, body: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockUpstream { addr, hits }
}

/// Config pointing every outbound call at `upstream`, with an unreachable
/// database that fails fast.
pub fn test_config(upstream: &MockUpstream) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.outbound.upstream_url = upstream.url();
    config.outbound.s3_endpoint = upstream.url();
    config.outbound.timeout_secs = 2;
    config.database.host = "127.0.0.1".into();
    config.database.port = 1;
    config.database.query_count = 1;
    config.database.acquire_timeout_secs = 1;
    config
}

/// A running app instance.
pub struct RunningApp {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl RunningApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("app did not shut down")
            .unwrap();
    }
}

/// Bind an ephemeral port and serve `config` with an in-memory sink.
pub async fn spawn_app(config: AppConfig) -> RunningApp {
    let sink = Arc::new(MemorySink::new());
    let dyn_sink: Arc<dyn MetricSink> = sink.clone();
    let app = App::build(config, dyn_sink, None).unwrap();
    let (addr, shutdown, handle) = serve(app).await;
    RunningApp {
        addr,
        sink,
        shutdown,
        handle,
    }
}

/// Serve `config` through a Prometheus sink wrapped around the global recorder.
pub async fn spawn_exporting_app(config: AppConfig, exporter: Arc<PrometheusSink>) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let dyn_sink: Arc<dyn MetricSink> = exporter.clone();
    let app = App::build(config, dyn_sink, Some(exporter)).unwrap();
    serve(app).await
}

async fn serve(app: App) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        app.serve(listener, server_shutdown).await.unwrap();
    });
    (addr, shutdown, handle)
}

/// Client without connection pooling or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// True for `1-<8 hex>-<24 hex>`.
pub fn is_xray_trace_id(id: &str) -> bool {
    let parts: Vec<&str> = id.split('-').collect();
    parts.len() == 3
        && parts[0] == "1"
        && parts[1].len() == 8
        && parts[2].len() == 24
        && parts[1..].iter().all(|p| p.chars().all(|c| c.is_ascii_hexdigit()))
}
