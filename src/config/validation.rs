//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, sampling bounds > 0, ports valid)
//! - Check URLs and paths are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::signals::sampling::{SamplingRangeError, UpperBound};
use crate::signals::{CPU_USAGE, TOTAL_HEAP_SIZE};

/// A single semantic problem in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),

    #[error(transparent)]
    SamplingRange(#[from] SamplingRangeError),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} '{value}' is not a valid http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("observability.metrics_path '{0}' must start with '/'")]
    InvalidMetricsPath(String),

    #[error("observability.metrics_path '{0}' collides with an application route")]
    ReservedMetricsPath(String),

    #[error(
        "database.probe_timeout_secs ({probe}) plus outbound.timeout_secs ({outbound}) must be below listener.request_timeout_secs ({request})"
    )]
    RequestBudget { probe: u64, outbound: u64, request: u64 },
}

const APP_ROUTES: [&str; 5] = [
    "/",
    "/aws-sdk-call",
    "/outgoing-http-call",
    "/outgoing-sampleapp",
    "/outgoing-psql-call",
];

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.is_empty() {
        errors.push(ValidationError::Empty("listener.host"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("listener.request_timeout_secs"));
    }

    if config.generator.time_interval_secs == 0 {
        errors.push(ValidationError::Zero("generator.time_interval_secs"));
    }
    let bounds = [
        (CPU_USAGE, config.generator.cpu_usage_upper_bound),
        (TOTAL_HEAP_SIZE, config.generator.total_heap_size_upper_bound),
    ];
    for (signal, bound) in bounds {
        if let Err(e) = UpperBound::new(signal, bound) {
            errors.push(e.into());
        }
    }

    check_url(&mut errors, "outbound.upstream_url", &config.outbound.upstream_url);
    check_url(&mut errors, "outbound.s3_endpoint", &config.outbound.s3_endpoint);
    if config.outbound.sample_app_host.is_empty() {
        errors.push(ValidationError::Empty("outbound.sample_app_host"));
    }
    if config.outbound.sample_app_ports.contains(&0) {
        errors.push(ValidationError::Zero("outbound.sample_app_ports entries"));
    }
    if config.outbound.timeout_secs == 0 {
        errors.push(ValidationError::Zero("outbound.timeout_secs"));
    }

    if config.database.query_count == 0 {
        errors.push(ValidationError::Zero("database.query_count"));
    }
    if config.database.probe_timeout_secs == 0 {
        errors.push(ValidationError::Zero("database.probe_timeout_secs"));
    }

    // The SQL route runs its probe batch and then an outbound call; both must
    // finish inside the request timeout.
    let probe = config.database.probe_timeout_secs;
    let outbound = config.outbound.timeout_secs;
    let request = config.listener.request_timeout_secs;
    if probe.saturating_add(outbound) >= request {
        errors.push(ValidationError::RequestBudget {
            probe,
            outbound,
            request,
        });
    }

    let metrics_path = &config.observability.metrics_path;
    if !metrics_path.starts_with('/') {
        errors.push(ValidationError::InvalidMetricsPath(metrics_path.clone()));
    } else if APP_ROUTES.contains(&metrics_path.as_str()) {
        errors.push(ValidationError::ReservedMetricsPath(metrics_path.clone()));
    }
    if config.observability.upkeep_interval_secs == 0 {
        errors.push(ValidationError::Zero("observability.upkeep_interval_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
