//! Telemetry sample app.
//!
//! An HTTP service for validating an observability pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                  TELEMETRY SAMPLE APP                 │
//!   Client         │  ┌──────────┐    ┌───────────┐    ┌──────────────┐   │
//!   ───────────────┼─▶│  http    │───▶│ handlers  │───▶│   outbound   │───┼──▶ AWS / HTTP /
//!                  │  │  server  │    │ (op span) │    │ reqwest/sqlx │   │    siblings / PG
//!                  │  └──────────┘    └─────┬─────┘    └──────────────┘   │
//!                  │                        │ record_completed_call        │
//!                  │                        ▼                              │
//!                  │  ┌──────────────┐  ┌──────────────────┐               │
//!                  │  │  generator   │─▶│   MetricSink     │◀── /metrics ──┼── Prometheus
//!                  │  │ (tick loop)  │  │ (Prometheus)     │   scrape       │
//!                  │  └──────────────┘  └──────────────────┘               │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use telemetry_sample_app::app::{histogram_buckets, App};
use telemetry_sample_app::config::resolve_config;
use telemetry_sample_app::lifecycle::{signals, Shutdown};
use telemetry_sample_app::observability::logging::init_logging;
use telemetry_sample_app::observability::metrics::{MetricSink, PrometheusSink};
use telemetry_sample_app::AppError;

#[derive(Parser)]
#[command(name = "telemetry-sample-app")]
#[command(about = "HTTP service emitting synthetic telemetry for pipeline validation", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve and validate the configuration, print it as JSON, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;

    if cli.check {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("failed to serialize configuration: {}", e),
        }
        return Ok(());
    }

    init_logging(config.observability.log_format)?;
    tracing::info!("telemetry-sample-app v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        time_interval_secs = config.generator.time_interval_secs,
        sample_app_ports = ?config.outbound.sample_app_ports,
        testing_id = %config.observability.testing_id,
        "Configuration loaded"
    );

    let exporter = Arc::new(PrometheusSink::install(&histogram_buckets(&config))?);
    let sink: Arc<dyn MetricSink> = exporter.clone();

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let app = App::build(config, sink, Some(exporter))?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    app.serve(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
