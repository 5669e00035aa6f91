//! Metric reporting contract.
//!
//! # Responsibilities
//! - Describe signals (name, kind, unit, description)
//! - Define the sink every signal reports through (`MetricSink`)
//! - Hand out `Instrument` handles that degrade to no-ops when registration fails
//!
//! # Data Flow
//! ```text
//! synchronous instruments:   handler/tick → Instrument::add/record → sink
//! observable instruments:    sink collection → registered callback → value
//! ```
//!
//! # Design Decisions
//! - Callbacks are registered exactly once, together with the signal
//! - Registration failures are logged and leave the instrument inert
//! - Labels are an opaque pass-through owned by the caller

pub mod memory;
pub mod prometheus;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

pub use memory::MemorySink;
pub use prometheus::PrometheusSink;

/// Kind of telemetry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Monotonic sum, pushed by the producer.
    Counter,
    /// Bidirectional sum, pushed by the producer.
    UpDownCounter,
    /// Distribution of recorded values.
    Histogram,
    /// Monotonic sum, computed on read.
    ObservableCounter,
    /// Point-in-time value, computed on read.
    ObservableGauge,
    /// Bidirectional sum, computed on read.
    ObservableUpDownCounter,
}

impl SignalKind {
    /// True for instruments whose value is pulled by the sink.
    pub fn is_observable(self) -> bool {
        matches!(
            self,
            SignalKind::ObservableCounter
                | SignalKind::ObservableGauge
                | SignalKind::ObservableUpDownCounter
        )
    }
}

/// Unit attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Milliseconds,
    Bytes,
    Count,
}

impl MetricUnit {
    /// UCUM code used by OpenTelemetry-style backends.
    pub fn as_ucum(self) -> &'static str {
        match self {
            MetricUnit::Milliseconds => "ms",
            MetricUnit::Bytes => "By",
            MetricUnit::Count => "1",
        }
    }

    pub(crate) fn to_metrics_unit(self) -> metrics::Unit {
        match self {
            MetricUnit::Milliseconds => metrics::Unit::Milliseconds,
            MetricUnit::Bytes => metrics::Unit::Bytes,
            MetricUnit::Count => metrics::Unit::Count,
        }
    }
}

/// Static description of a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDescriptor {
    pub name: String,
    pub kind: SignalKind,
    pub unit: MetricUnit,
    pub description: &'static str,
}

impl SignalDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: SignalKind,
        unit: MetricUnit,
        description: &'static str,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            unit,
            description,
        }
    }
}

/// Fixed key/value labels attached to every observation of a signal family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(Vec<(String, String)>);

impl Labels {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn to_metrics_labels(&self) -> Vec<metrics::Label> {
        self.0
            .iter()
            .map(|(k, v)| metrics::Label::new(k.clone(), v.clone()))
            .collect()
    }
}

impl From<&BTreeMap<String, String>> for Labels {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Self::new(map.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

/// Pull callback for an observable instrument.
pub type ObserveFn = Box<dyn Fn() -> i64 + Send + Sync>;

/// Errors raised while registering a signal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("signal '{0}' is already registered")]
    Duplicate(String),

    #[error("signal '{name}' of kind {kind:?} cannot be registered this way")]
    KindMismatch { name: String, kind: SignalKind },
}

/// A destination for telemetry signals.
///
/// Implementations must be safe to call concurrently from request handlers,
/// the generator loop and the sink's own collection.
pub trait MetricSink: Send + Sync {
    /// Register a synchronous signal.
    fn register(&self, descriptor: &SignalDescriptor) -> Result<(), RegistrationError>;

    /// Register an observable signal and the callback that produces its value.
    fn register_observable(
        &self,
        descriptor: &SignalDescriptor,
        labels: Labels,
        observe: ObserveFn,
    ) -> Result<(), RegistrationError>;

    /// Add a delta to a counter or up-down counter.
    fn add(&self, name: &str, delta: i64, labels: &Labels);

    /// Record one value into a histogram.
    fn record(&self, name: &str, value: i64, labels: &Labels);
}

/// Handle to a registered synchronous signal.
///
/// An inert instrument swallows every update; it is what callers get when
/// registration failed.
#[derive(Clone)]
pub struct Instrument {
    name: Option<String>,
    labels: Labels,
    sink: Arc<dyn MetricSink>,
}

impl Instrument {
    /// Register `descriptor` with `sink`, logging and degrading on failure.
    pub fn register(sink: &Arc<dyn MetricSink>, descriptor: SignalDescriptor, labels: Labels) -> Self {
        let name = match sink.register(&descriptor) {
            Ok(()) => {
                tracing::debug!(signal = %descriptor.name, kind = ?descriptor.kind, "Registered signal");
                Some(descriptor.name)
            }
            Err(e) => {
                tracing::warn!(signal = %descriptor.name, error = %e, "Signal registration failed, continuing without it");
                None
            }
        };

        Self {
            name,
            labels,
            sink: sink.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.name.is_some()
    }

    pub fn add(&self, delta: i64) {
        if let Some(name) = &self.name {
            self.sink.add(name, delta, &self.labels);
        }
    }

    pub fn record(&self, value: i64) {
        if let Some(name) = &self.name {
            self.sink.record(name, value, &self.labels);
        }
    }
}

impl fmt::Debug for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrument")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .finish()
    }
}

/// Register an observable signal, logging and continuing on failure.
///
/// Returns whether the callback is now live.
pub fn register_observable(
    sink: &Arc<dyn MetricSink>,
    descriptor: SignalDescriptor,
    labels: Labels,
    observe: ObserveFn,
) -> bool {
    match sink.register_observable(&descriptor, labels, observe) {
        Ok(()) => {
            tracing::debug!(signal = %descriptor.name, kind = ?descriptor.kind, "Registered observable signal");
            true
        }
        Err(e) => {
            tracing::warn!(signal = %descriptor.name, error = %e, "Observable registration failed, continuing without it");
            false
        }
    }
}

/// Reserve a signal name in a sink's registry.
///
/// Fails on duplicates and when a synchronous kind is registered as
/// observable (or the reverse).
pub(crate) fn claim_name(
    registry: &DashMap<String, SignalKind>,
    descriptor: &SignalDescriptor,
    observable: bool,
) -> Result<(), RegistrationError> {
    if descriptor.kind.is_observable() != observable {
        return Err(RegistrationError::KindMismatch {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
        });
    }

    match registry.entry(descriptor.name.clone()) {
        Entry::Occupied(_) => Err(RegistrationError::Duplicate(descriptor.name.clone())),
        Entry::Vacant(slot) => {
            slot.insert(descriptor.kind);
            Ok(())
        }
    }
}

/// Append the optional testing-id suffix to a base signal name.
pub fn signal_name(base: &str, testing_id: &str) -> String {
    if testing_id.is_empty() {
        base.to_string()
    } else {
        format!("{}_{}", base, testing_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_name_suffix() {
        assert_eq!(signal_name("timeAlive", ""), "timeAlive");
        assert_eq!(signal_name("timeAlive", "abc"), "timeAlive_abc");
    }

    #[test]
    fn test_inert_instrument_after_duplicate() {
        let memory = Arc::new(MemorySink::new());
        let sink: Arc<dyn MetricSink> = memory.clone();
        let desc = SignalDescriptor::new("dup", SignalKind::Counter, MetricUnit::Count, "d");

        let first = Instrument::register(&sink, desc.clone(), Labels::default());
        let second = Instrument::register(&sink, desc, Labels::default());
        assert!(first.is_active());
        assert!(!second.is_active());

        // Only the live handle reaches the sink.
        first.add(2);
        second.add(40);
        assert_eq!(memory.sum("dup"), Some(2));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let sink = MemorySink::new();
        let desc = SignalDescriptor::new("g", SignalKind::ObservableGauge, MetricUnit::Count, "d");
        assert_eq!(
            sink.register(&desc),
            Err(RegistrationError::KindMismatch {
                name: "g".into(),
                kind: SignalKind::ObservableGauge
            })
        );
    }

    #[test]
    fn test_observable_kinds() {
        assert!(SignalKind::ObservableGauge.is_observable());
        assert!(!SignalKind::Histogram.is_observable());
        assert_eq!(MetricUnit::Bytes.as_ucum(), "By");
    }
}
