//! Upstream HTTP calls and sibling sample-app chaining.

use reqwest::StatusCode;
use url::Url;

use crate::config::OutboundConfig;
use crate::outbound::{parse_url, OutboundError};

/// Path every sample app serves for chained invocations.
pub const SAMPLE_APP_PATH: &str = "/outgoing-sampleapp";

/// Client for the upstream URL and sibling sample apps.
#[derive(Debug, Clone)]
pub struct HttpCaller {
    client: reqwest::Client,
    upstream_url: Url,
    sample_app_host: String,
    sample_app_ports: Vec<u16>,
}

impl HttpCaller {
    pub fn new(client: reqwest::Client, config: &OutboundConfig) -> Result<Self, OutboundError> {
        Ok(Self {
            client,
            upstream_url: parse_url(&config.upstream_url)?,
            sample_app_host: config.sample_app_host.clone(),
            sample_app_ports: config.sample_app_ports.clone(),
        })
    }

    pub fn sample_app_ports(&self) -> &[u16] {
        &self.sample_app_ports
    }

    /// GET the configured upstream URL.
    pub async fn get_upstream(&self) -> Result<StatusCode, OutboundError> {
        tracing::info!(url = %self.upstream_url, "Making request to upstream");
        let response = self.client.get(self.upstream_url.clone()).send().await?;
        Ok(response.status())
    }

    /// URL of a sibling sample app's chaining endpoint.
    pub fn sample_app_url(&self, port: u16) -> String {
        if self.sample_app_host.contains(':') && !self.sample_app_host.starts_with('[') {
            format!("http://[{}]:{}{}", self.sample_app_host, port, SAMPLE_APP_PATH)
        } else {
            format!("http://{}:{}{}", self.sample_app_host, port, SAMPLE_APP_PATH)
        }
    }

    /// Invoke a sibling sample app.
    pub async fn invoke_sample_app(&self, port: u16) -> Result<StatusCode, OutboundError> {
        let url = self.sample_app_url(port);
        tracing::info!(port, url = %url, "Making request to sample app");
        let response = self.client.get(&url).send().await?;
        Ok(response.status())
    }
}
