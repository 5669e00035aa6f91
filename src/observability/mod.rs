//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics/ (counters, gauges, histograms via MetricSink)
//!     → tracing.rs (operation spans with X-Ray trace ids)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace id is returned to the caller of every instrumented endpoint
//! - Metric updates are cheap (atomics, sharded maps)

pub mod logging;
pub mod metrics;
pub mod tracing;
