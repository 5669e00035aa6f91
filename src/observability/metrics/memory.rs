//! In-process metric sink.
//!
//! Keeps running sums and histogram samples in memory and evaluates
//! observable callbacks on demand. Used by the test suite and handy when the
//! service is embedded without an exporter. Each histogram retains only its
//! most recent samples, so memory stays bounded on long runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;

use super::{claim_name, Labels, MetricSink, ObserveFn, RegistrationError, SignalDescriptor, SignalKind};

/// Samples retained per histogram.
pub const MAX_HISTOGRAM_SAMPLES: usize = 10_000;

struct Observable {
    name: String,
    observe: ObserveFn,
}

/// Thread-safe in-memory sink.
#[derive(Default)]
pub struct MemorySink {
    registry: DashMap<String, SignalKind>,
    sums: DashMap<String, i64>,
    histograms: DashMap<String, VecDeque<i64>>,
    observables: Mutex<Vec<Observable>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of a registered signal.
    pub fn kind(&self, name: &str) -> Option<SignalKind> {
        self.registry.get(name).map(|r| *r.value())
    }

    /// Running sum of a counter or up-down counter.
    pub fn sum(&self, name: &str) -> Option<i64> {
        self.sums.get(name).map(|r| *r.value())
    }

    /// Retained histogram values, oldest first.
    pub fn samples(&self, name: &str) -> Vec<i64> {
        self.histograms
            .get(name)
            .map(|r| r.value().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Evaluate one observable callback.
    pub fn observe(&self, name: &str) -> Option<i64> {
        let observables = self.observables.lock().expect("memory sink mutex poisoned");
        observables
            .iter()
            .find(|o| o.name == name)
            .map(|o| (o.observe)())
    }

    /// Evaluate every observable callback, as a collection cycle would.
    pub fn collect(&self) -> Vec<(String, i64)> {
        let observables = self.observables.lock().expect("memory sink mutex poisoned");
        observables
            .iter()
            .map(|o| (o.name.clone(), (o.observe)()))
            .collect()
    }
}

impl MetricSink for MemorySink {
    fn register(&self, descriptor: &SignalDescriptor) -> Result<(), RegistrationError> {
        claim_name(&self.registry, descriptor, false)?;
        match descriptor.kind {
            SignalKind::Histogram => {
                self.histograms.insert(descriptor.name.clone(), VecDeque::new());
            }
            _ => {
                self.sums.insert(descriptor.name.clone(), 0);
            }
        }
        Ok(())
    }

    fn register_observable(
        &self,
        descriptor: &SignalDescriptor,
        _labels: Labels,
        observe: ObserveFn,
    ) -> Result<(), RegistrationError> {
        claim_name(&self.registry, descriptor, true)?;
        self.observables
            .lock()
            .expect("memory sink mutex poisoned")
            .push(Observable {
                name: descriptor.name.clone(),
                observe,
            });
        Ok(())
    }

    fn add(&self, name: &str, delta: i64, _labels: &Labels) {
        match self.kind(name) {
            Some(SignalKind::Counter) if delta < 0 => {
                tracing::debug!(signal = %name, delta, "Ignoring negative delta on monotonic counter");
            }
            Some(SignalKind::Counter) | Some(SignalKind::UpDownCounter) => {
                *self.sums.entry(name.to_string()).or_insert(0) += delta;
            }
            _ => {
                tracing::debug!(signal = %name, "Add on unknown or non-sum signal ignored");
            }
        }
    }

    fn record(&self, name: &str, value: i64, _labels: &Labels) {
        match self.histograms.get_mut(name) {
            Some(mut samples) => {
                if samples.len() == MAX_HISTOGRAM_SAMPLES {
                    samples.pop_front();
                }
                samples.push_back(value);
            }
            None => tracing::debug!(signal = %name, "Record on unknown histogram ignored"),
        }
    }
}
