//! Top-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::outbound::OutboundError;
use crate::signals::generator::SettingsError;

/// Errors that abort startup or serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid generator settings: {0}")]
    Generator(#[from] SettingsError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build outbound clients: {0}")]
    Outbound(#[from] OutboundError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
