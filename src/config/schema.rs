//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the sample app.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Synthetic metric generator settings.
    pub generator: GeneratorConfig,

    /// Outbound call targets.
    pub outbound: OutboundConfig,

    /// Postgres connection settings.
    pub database: DatabaseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ListenerConfig {
    /// `host:port`, with IPv6 hosts bracketed.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4567,
            request_timeout_secs: 30,
        }
    }
}

/// Synthetic metric generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seconds between generator ticks.
    pub time_interval_secs: u64,

    /// Seconds added to `timeAlive` per tick.
    pub time_alive_increment: u64,

    /// Exclusive upper bound of `cpuUsage` samples.
    pub cpu_usage_upper_bound: u64,

    /// Exclusive upper bound of `totalHeapSize` samples.
    pub total_heap_size_upper_bound: u64,

    /// Inclusive upper bound of the `threadsActive` walk.
    pub threads_active_upper_bound: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            time_interval_secs: 1,
            time_alive_increment: 1,
            cpu_usage_upper_bound: 100,
            total_heap_size_upper_bound: 100,
            threads_active_upper_bound: 10,
        }
    }
}

/// Outbound call configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutboundConfig {
    /// Target of the plain outbound HTTP call.
    pub upstream_url: String,

    /// Endpoint queried by the mock AWS SDK call.
    pub s3_endpoint: String,

    /// Host where sibling sample apps listen.
    pub sample_app_host: String,

    /// Ports of sibling sample apps to chain to.
    pub sample_app_ports: Vec<u16>,

    /// Timeout for each outbound request in seconds.
    pub timeout_secs: u64,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            upstream_url: "https://aws.amazon.com/".to_string(),
            s3_endpoint: "https://s3.amazonaws.com/".to_string(),
            sample_app_host: "127.0.0.1".to_string(),
            sample_app_ports: Vec::new(),
            timeout_secs: 10,
        }
    }
}

/// Postgres connection configuration.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub dbname: String,

    /// Number of `SELECT 1` queries per database call.
    pub query_count: u32,

    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_secs: u64,

    /// Deadline in seconds for a whole batch of `SELECT 1` queries.
    pub probe_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "postgres".to_string(),
            query_count: 10,
            acquire_timeout_secs: 5,
            probe_timeout_secs: 10,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("query_count", &self.query_count)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Path serving the Prometheus exposition.
    pub metrics_path: String,

    /// Suffix appended as `_<id>` to every metric name (empty = none).
    pub testing_id: String,

    /// Seconds between recorder upkeep runs.
    pub upkeep_interval_secs: u64,

    /// Labels attached to the synthetic signals.
    pub random_labels: BTreeMap<String, String>,

    /// Labels attached to the request-based signals.
    pub request_labels: BTreeMap<String, String>,
}

fn default_labels(metric_type: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("signal".to_string(), "metric".to_string()),
        ("language".to_string(), "rust".to_string()),
        ("metricType".to_string(), metric_type.to_string()),
    ])
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_path: "/metrics".to_string(),
            testing_id: String::new(),
            upkeep_interval_secs: 5,
            random_labels: default_labels("random"),
            request_labels: default_labels("request"),
        }
    }
}
