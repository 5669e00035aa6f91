//! Telemetry sample app library.
//!
//! A small HTTP service whose endpoints make trivial outbound calls (AWS,
//! HTTP, sibling instances, Postgres) while emitting spans, logs and a set of
//! synthetic and request-based metrics.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod outbound;
pub mod signals;

pub use app::App;
pub use config::schema::AppConfig;
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
