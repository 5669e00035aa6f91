//! Request-based metrics.
//!
//! # Responsibilities
//! - Count handled API requests (atomic, never decreasing)
//! - Report bytes sent and latency for each completed outbound call
//! - Expose the request count to the sink through a pull callback
//!
//! # Design Decisions
//! - The request path only touches an atomic and the sink; no I/O
//! - The pull callback is registered once, holding its own counter handle

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics::{
    register_observable, signal_name, Instrument, Labels, MetricSink, MetricUnit, SignalDescriptor,
    SignalKind,
};
use crate::signals::sampling::{sample_below, BYTES_SENT_BOUND, LATENCY_BOUND};
use crate::signals::{LATENCY_TIME, TOTAL_API_REQUESTS, TOTAL_BYTES_SENT};

/// Histogram buckets for the latency signal, in milliseconds.
pub const LATENCY_BUCKETS_MS: [f64; 3] = [100.0, 300.0, 500.0];

/// Aggregates request-level telemetry.
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    requests: Arc<AtomicU64>,
    bytes_sent: Instrument,
    latency: Instrument,
}

impl RequestMetrics {
    pub fn register(sink: &Arc<dyn MetricSink>, labels: Labels, testing_id: &str) -> Self {
        let bytes_sent = Instrument::register(
            sink,
            SignalDescriptor::new(
                signal_name(TOTAL_BYTES_SENT, testing_id),
                SignalKind::Counter,
                MetricUnit::Bytes,
                "Keeps a sum of the total amount of bytes sent while the application is alive",
            ),
            labels.clone(),
        );

        let requests = Arc::new(AtomicU64::new(0));
        let observed = requests.clone();
        register_observable(
            sink,
            SignalDescriptor::new(
                signal_name(TOTAL_API_REQUESTS, testing_id),
                SignalKind::ObservableCounter,
                MetricUnit::Count,
                "Increments by one every time a sampleapp endpoint is used",
            ),
            labels.clone(),
            Box::new(move || observed.load(Ordering::Acquire).min(i64::MAX as u64) as i64),
        );

        let latency = Instrument::register(
            sink,
            SignalDescriptor::new(
                signal_name(LATENCY_TIME, testing_id),
                SignalKind::Histogram,
                MetricUnit::Milliseconds,
                "Measures latency time in buckets of 100 300 and 500",
            ),
            labels,
        );

        Self {
            requests,
            bytes_sent,
            latency,
        }
    }

    /// Count one handled request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::AcqRel);
    }

    pub fn current_request_count(&self) -> u64 {
        self.requests.load(Ordering::Acquire)
    }

    /// Add a sampled byte count in `[0, 1024)`; returns the sample.
    pub fn record_bytes_sent(&self) -> i64 {
        let bytes = sample_below(&mut rand::thread_rng(), BYTES_SENT_BOUND);
        self.bytes_sent.add(bytes);
        bytes
    }

    /// Record a sampled latency in `[0, 512)` ms; returns the sample.
    pub fn record_latency_sample(&self) -> i64 {
        let latency = sample_below(&mut rand::thread_rng(), LATENCY_BOUND);
        self.latency.record(latency);
        latency
    }

    /// Everything an instrumented endpoint reports after its outbound call.
    pub fn record_completed_call(&self) {
        self.record_request();
        self.record_bytes_sent();
        self.record_latency_sample();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::MemorySink;

    fn aggregator() -> (Arc<MemorySink>, RequestMetrics) {
        let memory = Arc::new(MemorySink::new());
        let sink: Arc<dyn MetricSink> = memory.clone();
        let rm = RequestMetrics::register(&sink, Labels::default(), "");
        (memory, rm)
    }

    #[test]
    fn test_read_is_idempotent() {
        let (_sink, rm) = aggregator();
        rm.record_request();
        rm.record_request();
        assert_eq!(rm.current_request_count(), 2);
        assert_eq!(rm.current_request_count(), 2);
    }

    #[test]
    fn test_concurrent_requests_are_not_lost() {
        let (sink, rm) = aggregator();
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let rm = rm.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        rm.record_request();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(rm.current_request_count(), 100);
        assert_eq!(sink.observe(TOTAL_API_REQUESTS), Some(100));
    }

    #[test]
    fn test_samples_in_range_and_summed() {
        let (sink, rm) = aggregator();
        let mut total = 0;
        for _ in 0..1_000 {
            let bytes = rm.record_bytes_sent();
            assert!((0..1024).contains(&bytes));
            total += bytes;
            assert!((0..512).contains(&rm.record_latency_sample()));
        }
        assert_eq!(sink.sum(TOTAL_BYTES_SENT), Some(total));
        assert_eq!(sink.samples(LATENCY_TIME).len(), 1_000);
        assert!(sink.samples(LATENCY_TIME).iter().all(|v| (0..512).contains(v)));
    }

    #[test]
    fn test_completed_call_records_all_three() {
        let (sink, rm) = aggregator();
        rm.record_completed_call();
        assert_eq!(rm.current_request_count(), 1);
        assert_eq!(sink.samples(LATENCY_TIME).len(), 1);
        assert!(sink.sum(TOTAL_BYTES_SENT).is_some());
    }
}
