//! Mock AWS SDK call.
//!
//! Issues an unsigned `ListBuckets` request (`GET /` on the S3 endpoint). No
//! credentials are attached, so the service answers 403; the call exists only
//! to produce an outbound AWS span.

use reqwest::StatusCode;
use url::Url;

use crate::outbound::{parse_url, OutboundError};

#[derive(Debug, Clone)]
pub struct S3Client {
    client: reqwest::Client,
    endpoint: Url,
}

impl S3Client {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Result<Self, OutboundError> {
        Ok(Self {
            client,
            endpoint: parse_url(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send an anonymous ListBuckets request.
    pub async fn list_buckets(&self) -> Result<StatusCode, OutboundError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header("x-amz-content-sha256", "UNSIGNED-PAYLOAD")
            .send()
            .await?;
        let status = response.status();
        tracing::debug!(endpoint = %self.endpoint, status = %status, "ListBuckets returned");
        Ok(status)
    }
}
