//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, access log, timeout)
//! - Bind server to listener
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::middleware::access_log;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::PrometheusSink;
use crate::outbound::Outbound;
use crate::signals::RequestMetrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub requests: RequestMetrics,
    pub outbound: Arc<Outbound>,
    /// Present when metrics are exported through Prometheus.
    pub exporter: Option<Arc<PrometheusSink>>,
}

/// HTTP server for the sample app.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(handlers::index))
            .route("/aws-sdk-call", get(handlers::aws_sdk_call))
            .route("/outgoing-http-call", get(handlers::outgoing_http_call))
            .route("/outgoing-sampleapp", get(handlers::outgoing_sampleapp))
            .route("/outgoing-psql-call", get(handlers::outgoing_psql_call));

        if state.exporter.is_some() {
            router = router.route(&config.observability.metrics_path, get(handlers::metrics_exposition));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(middleware::from_fn(access_log))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Router with all layers applied, for driving the app in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.signaled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::{Labels, MemorySink, MetricSink};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server(config: AppConfig) -> HttpServer {
        let sink: Arc<dyn MetricSink> = Arc::new(MemorySink::new());
        let state = AppState {
            requests: RequestMetrics::register(&sink, Labels::default(), ""),
            outbound: Arc::new(Outbound::from_config(&config).unwrap()),
            exporter: None,
        };
        HttpServer::new(config, state)
    }

    #[tokio::test]
    async fn test_index_sets_request_id() {
        let router = server(AppConfig::default()).router();
        let res = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_propagated() {
        let router = server(AppConfig::default()).router();
        let req = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = router.oneshot(req).await.unwrap();

        assert_eq!(res.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_metrics_route_requires_exporter() {
        let router = server(AppConfig::default()).router();
        let res = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
