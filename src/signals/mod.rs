//! Synthetic and request-based telemetry signals.
//!
//! # Data Flow
//! ```text
//! generator.rs  (background tick)   → timeAlive, threadsActive
//! sampling.rs   (sink collection)   → cpuUsage, totalHeapSize
//! requests.rs   (request handlers)  → totalApiRequests, totalBytesSent, latencyTime
//!     → observability::metrics::MetricSink
//! ```

pub mod generator;
pub mod requests;
pub mod sampling;

pub use generator::{GeneratorSettings, SettingsError, SyntheticMetricGenerator, ThreadOscillator};
pub use requests::RequestMetrics;

pub const TIME_ALIVE: &str = "timeAlive";
pub const CPU_USAGE: &str = "cpuUsage";
pub const TOTAL_HEAP_SIZE: &str = "totalHeapSize";
pub const THREADS_ACTIVE: &str = "threadsActive";
pub const TOTAL_BYTES_SENT: &str = "totalBytesSent";
pub const TOTAL_API_REQUESTS: &str = "totalApiRequests";
pub const LATENCY_TIME: &str = "latencyTime";
