//! Service assembly.
//!
//! # Responsibilities
//! - Register every signal with the sink, once
//! - Build outbound clients and the HTTP server
//! - Run the generator, recorder upkeep and server until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::time::{self, MissedTickBehavior};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{signal_name, Labels, MetricSink, PrometheusSink};
use crate::outbound::Outbound;
use crate::signals::requests::LATENCY_BUCKETS_MS;
use crate::signals::{GeneratorSettings, RequestMetrics, SyntheticMetricGenerator, LATENCY_TIME};

/// Histogram bucket overrides for the Prometheus recorder.
pub fn histogram_buckets(config: &AppConfig) -> Vec<(String, Vec<f64>)> {
    vec![(
        signal_name(LATENCY_TIME, &config.observability.testing_id),
        LATENCY_BUCKETS_MS.to_vec(),
    )]
}

/// A fully wired, not yet running service.
pub struct App {
    server: HttpServer,
    generator: SyntheticMetricGenerator,
    requests: RequestMetrics,
    outbound: Arc<Outbound>,
    exporter: Option<Arc<PrometheusSink>>,
    upkeep_interval: Duration,
}

impl App {
    /// Register signals with `sink` and build the server.
    ///
    /// `exporter` enables the metrics route; pass the same Prometheus sink
    /// as `sink` when exporting, or `None` with any other sink.
    pub fn build(
        config: AppConfig,
        sink: Arc<dyn MetricSink>,
        exporter: Option<Arc<PrometheusSink>>,
    ) -> Result<Self, AppError> {
        let observability = &config.observability;
        let settings = GeneratorSettings::from_config(&config.generator)?;

        let generator = SyntheticMetricGenerator::register(
            &sink,
            settings,
            Labels::from(&observability.random_labels),
            &observability.testing_id,
        );
        let requests = RequestMetrics::register(
            &sink,
            Labels::from(&observability.request_labels),
            &observability.testing_id,
        );

        let outbound = Arc::new(Outbound::from_config(&config)?);
        let upkeep_interval = Duration::from_secs(observability.upkeep_interval_secs);

        let state = AppState {
            requests: requests.clone(),
            outbound: outbound.clone(),
            exporter: exporter.clone(),
        };
        let server = HttpServer::new(config, state);

        Ok(Self {
            server,
            generator,
            requests,
            outbound,
            exporter,
            upkeep_interval,
        })
    }

    pub fn requests(&self) -> &RequestMetrics {
        &self.requests
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn serve(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), AppError> {
        let generator = tokio::spawn(self.generator.run(shutdown.clone()));

        let upkeep = self
            .exporter
            .clone()
            .map(|exporter| tokio::spawn(run_upkeep(exporter, self.upkeep_interval, shutdown.clone())));

        let database = self.outbound.clone();
        tokio::spawn(async move {
            match database.database.ping().await {
                Ok(()) => tracing::info!("Database reachable"),
                Err(e) => tracing::warn!(error = %e, "Database unreachable; SQL endpoint will log failures"),
            }
        });

        let result = self.server.run(listener, shutdown.clone()).await;

        // Stop background tasks even when the server exited on its own.
        shutdown.trigger();
        if let Err(e) = generator.await {
            tracing::error!(error = %e, "Generator task failed");
        }
        if let Some(upkeep) = upkeep {
            if let Err(e) = upkeep.await {
                tracing::error!(error = %e, "Upkeep task failed");
            }
        }
        self.outbound.database.close().await;

        Ok(result?)
    }
}

async fn run_upkeep(exporter: Arc<PrometheusSink>, interval: Duration, shutdown: Shutdown) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let stopped = shutdown.signaled();
    tokio::pin!(stopped);

    loop {
        tokio::select! {
            _ = ticker.tick() => exporter.run_upkeep(),
            _ = &mut stopped => break,
        }
    }
}
