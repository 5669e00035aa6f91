//! Outbound calls made by the instrumented endpoints.
//!
//! # Responsibilities
//! - Plain HTTP GET to the configured upstream (`upstream.rs`)
//! - Chained calls to sibling sample apps (`upstream.rs`)
//! - Mock AWS SDK call against the S3 endpoint (`aws.rs`)
//! - `SELECT 1` probes against Postgres (`database.rs`)
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (connection pooling, per-request timeout)
//! - Non-2xx upstream statuses are not errors; only transport failures are
//! - The database pool connects lazily so the service starts without Postgres

pub mod aws;
pub mod database;
pub mod upstream;

use std::time::Duration;

use thiserror::Error;

use crate::config::AppConfig;

pub use aws::S3Client;
pub use database::Database;
pub use upstream::HttpCaller;

/// Failure of an outbound call.
#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

/// All outbound clients, shared by the handlers.
pub struct Outbound {
    pub http: HttpCaller,
    pub s3: S3Client,
    pub database: Database,
}

impl Outbound {
    /// Build every client from configuration. Does not perform I/O.
    pub fn from_config(config: &AppConfig) -> Result<Self, OutboundError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.outbound.timeout_secs))
            .user_agent(concat!("telemetry-sample-app/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http: HttpCaller::new(client.clone(), &config.outbound)?,
            s3: S3Client::new(client, &config.outbound.s3_endpoint)?,
            database: Database::connect_lazy(&config.database),
        })
    }
}

pub(crate) fn parse_url(value: &str) -> Result<url::Url, OutboundError> {
    url::Url::parse(value).map_err(|_| OutboundError::InvalidUrl(value.to_string()))
}
