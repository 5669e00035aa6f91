//! Prometheus-backed metric sink.
//!
//! # Responsibilities
//! - Describe signals to the `metrics` facade (unit + help text)
//! - Forward synchronous updates as counter/gauge/histogram operations
//! - Evaluate observable callbacks whenever the exposition is rendered
//!
//! # Design Decisions
//! - Uses the global `metrics` recorder installed by `install`
//! - Observable values are pulled at scrape time, not on a timer of our own
//! - Counters drop negative deltas; up-down counters map to gauges

use std::sync::Mutex;

use dashmap::DashMap;
use metrics::Label;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use super::{claim_name, Labels, MetricSink, ObserveFn, RegistrationError, SignalDescriptor, SignalKind};

struct Observable {
    name: String,
    kind: SignalKind,
    labels: Vec<Label>,
    observe: ObserveFn,
}

/// Sink rendering Prometheus text exposition.
pub struct PrometheusSink {
    handle: PrometheusHandle,
    registry: DashMap<String, SignalKind>,
    observables: Mutex<Vec<Observable>>,
}

impl PrometheusSink {
    /// Install a global Prometheus recorder and wrap its handle.
    ///
    /// `buckets` overrides histogram buckets per full metric name.
    pub fn install(buckets: &[(String, Vec<f64>)]) -> Result<Self, BuildError> {
        let mut builder = PrometheusBuilder::new();
        for (name, values) in buckets {
            builder = builder.set_buckets_for_metric(Matcher::Full(name.clone()), values)?;
        }
        let handle = builder.install_recorder()?;
        tracing::info!(histograms = buckets.len(), "Prometheus recorder installed");
        Ok(Self::from_handle(handle))
    }

    /// Wrap an existing handle (e.g. from a locally scoped recorder).
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self {
            handle,
            registry: DashMap::new(),
            observables: Mutex::new(Vec::new()),
        }
    }

    /// Evaluate every observable callback and publish its value.
    pub fn collect(&self) {
        let observables = self.observables.lock().expect("prometheus sink mutex poisoned");
        for o in observables.iter() {
            let value = (o.observe)();
            match o.kind {
                SignalKind::ObservableCounter => {
                    metrics::counter!(o.name.clone(), o.labels.clone()).absolute(value.max(0) as u64);
                }
                _ => {
                    metrics::gauge!(o.name.clone(), o.labels.clone()).set(value as f64);
                }
            }
        }
    }

    /// Collect observables, then render the text exposition.
    pub fn render(&self) -> String {
        self.collect();
        self.handle.render()
    }

    /// Housekeeping for the recorder (histogram rollover, idle cleanup).
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }

    fn describe(descriptor: &SignalDescriptor) {
        let name = descriptor.name.clone();
        let unit = descriptor.unit.to_metrics_unit();
        let help = descriptor.description;
        match descriptor.kind {
            SignalKind::Counter | SignalKind::ObservableCounter => {
                metrics::describe_counter!(name, unit, help);
            }
            SignalKind::Histogram => {
                metrics::describe_histogram!(name, unit, help);
            }
            SignalKind::UpDownCounter
            | SignalKind::ObservableGauge
            | SignalKind::ObservableUpDownCounter => {
                metrics::describe_gauge!(name, unit, help);
            }
        }
    }
}

impl MetricSink for PrometheusSink {
    fn register(&self, descriptor: &SignalDescriptor) -> Result<(), RegistrationError> {
        claim_name(&self.registry, descriptor, false)?;
        Self::describe(descriptor);
        Ok(())
    }

    fn register_observable(
        &self,
        descriptor: &SignalDescriptor,
        labels: Labels,
        observe: ObserveFn,
    ) -> Result<(), RegistrationError> {
        claim_name(&self.registry, descriptor, true)?;
        Self::describe(descriptor);
        self.observables
            .lock()
            .expect("prometheus sink mutex poisoned")
            .push(Observable {
                name: descriptor.name.clone(),
                kind: descriptor.kind,
                labels: labels.to_metrics_labels(),
                observe,
            });
        Ok(())
    }

    fn add(&self, name: &str, delta: i64, labels: &Labels) {
        let kind = self.registry.get(name).map(|r| *r.value());
        match kind {
            Some(SignalKind::Counter) => {
                if delta >= 0 {
                    metrics::counter!(name.to_string(), labels.to_metrics_labels()).increment(delta as u64);
                } else {
                    tracing::debug!(signal = %name, delta, "Ignoring negative delta on monotonic counter");
                }
            }
            Some(SignalKind::UpDownCounter) => {
                let gauge = metrics::gauge!(name.to_string(), labels.to_metrics_labels());
                if delta >= 0 {
                    gauge.increment(delta as f64);
                } else {
                    gauge.decrement(delta.unsigned_abs() as f64);
                }
            }
            _ => tracing::debug!(signal = %name, "Add on unknown or non-sum signal ignored"),
        }
    }

    fn record(&self, name: &str, value: i64, labels: &Labels) {
        if self.registry.get(name).map(|r| *r.value()) == Some(SignalKind::Histogram) {
            metrics::histogram!(name.to_string(), labels.to_metrics_labels()).record(value as f64);
        } else {
            tracing::debug!(signal = %name, "Record on unknown histogram ignored");
        }
    }
}
