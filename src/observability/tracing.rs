//! Operation tagging and trace identifiers.
//!
//! # Responsibilities
//! - Generate trace ids in AWS X-Ray format
//! - Open a span per instrumented operation and log its completion
//!
//! # Design Decisions
//! - No context propagation: every inbound request starts a new trace
//! - The first 32 bits of a trace id carry the start time in epoch seconds

use std::fmt;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::Span;

/// 128-bit trace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// New id stamped with the current time.
    pub fn generate() -> Self {
        let epoch_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32;
        let random = uuid::Uuid::new_v4().as_u128();
        Self::from_parts(epoch_secs, random)
    }

    /// Combine a timestamp with the low 96 bits of `random`.
    pub fn from_parts(epoch_secs: u32, random: u128) -> Self {
        let low = random & ((1u128 << 96) - 1);
        Self(((epoch_secs as u128) << 96) | low)
    }

    pub fn epoch_secs(&self) -> u32 {
        (self.0 >> 96) as u32
    }

    /// `1-<8 hex time>-<24 hex random>`.
    pub fn to_xray(&self) -> String {
        let hex = format!("{:032x}", self.0);
        format!("1-{}-{}", &hex[..8], &hex[8..])
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A tagged unit of work: a span plus the trace it belongs to.
#[derive(Debug)]
pub struct Operation {
    name: &'static str,
    trace_id: TraceId,
    span: Span,
    started: Instant,
}

impl Operation {
    /// Start a new trace rooted at this operation.
    pub fn start(name: &'static str) -> Self {
        Self::with_trace(name, TraceId::generate())
    }

    /// Start an operation inside an existing trace.
    pub fn with_trace(name: &'static str, trace_id: TraceId) -> Self {
        let span = tracing::info_span!("operation", operation = name, trace_id = %trace_id);
        Self {
            name,
            trace_id,
            span,
            started: Instant::now(),
        }
    }

    /// Child operation sharing this trace id.
    pub fn child(&self, name: &'static str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "operation", operation = name, trace_id = %self.trace_id);
        Self {
            name,
            trace_id: self.trace_id,
            span,
            started: Instant::now(),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Mark the operation complete.
    pub fn complete(self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.span.in_scope(|| {
            tracing::debug!(operation = self.name, elapsed_ms, "Operation complete");
        });
    }
}
