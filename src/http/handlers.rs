//! Endpoint handlers.
//!
//! Each instrumented endpoint opens an operation span, performs its outbound
//! call, reports request metrics and answers with the trace id. Outbound
//! failures are logged; they never change the response.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::Instrument as _;

use crate::http::response::{TraceResponse, INDEX_HTML};
use crate::http::server::AppState;
use crate::observability::tracing::Operation;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Mock AWS SDK call.
pub async fn aws_sdk_call(State(state): State<AppState>) -> Json<TraceResponse> {
    let op = Operation::start("aws-sdk-call");

    async {
        if let Err(e) = state.outbound.s3.list_buckets().await {
            tracing::error!(error = %e, "Error making AWS SDK call");
        }
    }
    .instrument(op.span().clone())
    .await;

    state.requests.record_completed_call();
    finish(op)
}

/// Plain outbound HTTP call.
pub async fn outgoing_http_call(State(state): State<AppState>) -> Json<TraceResponse> {
    let op = Operation::start("outgoing-http-call");

    async {
        if let Err(e) = state.outbound.http.get_upstream().await {
            tracing::error!(error = %e, "Error making upstream request");
        }
    }
    .instrument(op.span().clone())
    .await;

    state.requests.record_completed_call();
    finish(op)
}

/// Chain to sibling sample apps, or make a leaf request when there are none.
///
/// Only the leaf request reports request metrics; chained hops are counted by
/// the instance that finally makes the leaf call.
pub async fn outgoing_sampleapp(State(state): State<AppState>) -> Json<TraceResponse> {
    let op = Operation::start("invoke-sample-apps");
    let ports = state.outbound.http.sample_app_ports();

    if ports.is_empty() {
        let leaf = op.child("leaf-request");
        async {
            if let Err(e) = state.outbound.http.get_upstream().await {
                tracing::error!(error = %e, "Error making leaf request");
            }
        }
        .instrument(leaf.span().clone())
        .await;

        state.requests.record_completed_call();
        leaf.complete();
    } else {
        // Siblings are invoked one after another, in configured order.
        for &port in ports {
            let hop = op.child("invoke-sample-app");
            async {
                if let Err(e) = state.outbound.http.invoke_sample_app(port).await {
                    tracing::error!(port, error = %e, "Error making request to sample app");
                }
            }
            .instrument(hop.span().clone())
            .await;
            hop.complete();
        }
    }

    finish(op)
}

/// Postgres probes followed by an upstream call.
pub async fn outgoing_psql_call(State(state): State<AppState>) -> Json<TraceResponse> {
    let op = Operation::start("outgoing-psql-call");

    async {
        let summary = state.outbound.database.run_probe_queries().await;
        tracing::debug!(succeeded = summary.succeeded, failed = summary.failed, "SQL probes finished");

        if let Err(e) = state.outbound.http.get_upstream().await {
            tracing::error!(error = %e, "Error making upstream request");
        }
    }
    .instrument(op.span().clone())
    .await;

    state.requests.record_completed_call();
    finish(op)
}

/// Prometheus text exposition.
pub async fn metrics_exposition(State(state): State<AppState>) -> Response {
    match &state.exporter {
        Some(exporter) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            exporter.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics exporter disabled").into_response(),
    }
}

fn finish(op: Operation) -> Json<TraceResponse> {
    let body = TraceResponse::from(op.trace_id());
    op.complete();
    Json(body)
}
