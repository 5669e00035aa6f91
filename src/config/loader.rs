//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the effective configuration: file (or defaults), then process
/// environment overrides, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => read_config(p)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Recognised variables: `LISTEN_HOST`, `LISTEN_PORT`, `INSTANCE_ID`,
/// `SAMPLE_APP_PORTS` (comma separated), `POSTGRES_HOST`, `POSTGRES_PORT`,
/// `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_DB`.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("LISTEN_HOST") {
        config.listener.host = host;
    }
    if let Some(port) = lookup("LISTEN_PORT") {
        config.listener.port = parse_port("LISTEN_PORT", &port)?;
    }
    if let Some(id) = lookup("INSTANCE_ID") {
        config.observability.testing_id = id;
    }
    if let Some(ports) = lookup("SAMPLE_APP_PORTS") {
        config.outbound.sample_app_ports = ports
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| parse_port("SAMPLE_APP_PORTS", p))
            .collect::<Result<_, _>>()?;
    }

    if let Some(host) = lookup("POSTGRES_HOST") {
        config.database.host = host;
    }
    if let Some(port) = lookup("POSTGRES_PORT") {
        config.database.port = parse_port("POSTGRES_PORT", &port)?;
    }
    if let Some(user) = lookup("POSTGRES_USER") {
        config.database.user = user;
    }
    if let Some(password) = lookup("POSTGRES_PASSWORD") {
        config.database.password = password;
    }
    if let Some(db) = lookup("POSTGRES_DB") {
        config.database.dbname = db;
    }
    Ok(())
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}
