//! Response bodies.

use serde::{Deserialize, Serialize};

use crate::observability::tracing::TraceId;

/// Body returned by every instrumented endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResponse {
    #[serde(rename = "traceId")]
    pub trace_id: String,
}

impl From<TraceId> for TraceResponse {
    fn from(id: TraceId) -> Self {
        Self {
            trace_id: id.to_xray(),
        }
    }
}

/// Landing page linking the instrumented endpoints.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Telemetry Sample App</title>
</head>
<body>
    <p><a href="/aws-sdk-call">/aws-sdk-call</a>: make an AWS SDK call</p>
    <p><a href="/outgoing-http-call">/outgoing-http-call</a>: make an outgoing HTTP call</p>
    <p><a href="/outgoing-sampleapp">/outgoing-sampleapp</a>: make an outgoing call to another sample app</p>
    <p><a href="/outgoing-psql-call">/outgoing-psql-call</a>: make an outgoing call to a Postgres database</p>
</body>
</html>
"#;
