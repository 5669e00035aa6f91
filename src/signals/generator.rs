//! Synthetic metric generator.
//!
//! # Responsibilities
//! - Register the four synthetic signals once at startup
//! - Advance the tick-driven signals on a fixed interval
//! - Serve the pull-driven signals from pure samplers
//!
//! # Signals
//! - `timeAlive` (counter, ms): grows by `time_alive_increment * 1000` per tick
//! - `threadsActive` (up-down counter): triangle wave in `[0, bound]`
//! - `cpuUsage` (observable gauge): uniform in `[0, bound)` per collection
//! - `totalHeapSize` (observable up-down counter): uniform in `[0, bound)` per collection
//!
//! # Design Decisions
//! - State lives on the generator instance; the tick loop is its only writer
//! - Registration failures leave the affected signal inert, never abort
//! - The loop exits on the shared shutdown signal, even one fired before it started

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, MissedTickBehavior};

use crate::config::GeneratorConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{
    register_observable, signal_name, Instrument, Labels, MetricSink, MetricUnit, SignalDescriptor,
    SignalKind,
};
use crate::signals::sampling::{sample_cpu_usage, sample_heap_size, SamplingRangeError, UpperBound};
use crate::signals::{CPU_USAGE, THREADS_ACTIVE, TIME_ALIVE, TOTAL_HEAP_SIZE};

/// Invalid generator settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("generator.time_interval_secs must be greater than 0")]
    ZeroInterval,

    #[error(transparent)]
    SamplingRange(#[from] SamplingRangeError),
}

/// Validated generator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub interval: Duration,
    pub time_alive_increment: u64,
    pub cpu_usage_bound: UpperBound,
    pub heap_size_bound: UpperBound,
    pub threads_active_bound: u64,
}

impl GeneratorSettings {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, SettingsError> {
        if config.time_interval_secs == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        Ok(Self {
            interval: Duration::from_secs(config.time_interval_secs),
            time_alive_increment: config.time_alive_increment,
            cpu_usage_bound: UpperBound::new(CPU_USAGE, config.cpu_usage_upper_bound)?,
            heap_size_bound: UpperBound::new(TOTAL_HEAP_SIZE, config.total_heap_size_upper_bound)?,
            threads_active_bound: config.threads_active_upper_bound,
        })
    }
}

/// Bounded bidirectional walk driving `threadsActive`.
///
/// Reaching a bound flips the direction and steps the other way in the same
/// tick, so the value turns around without dwelling at the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadOscillator {
    count: u64,
    ascending: bool,
    upper_bound: u64,
}

impl ThreadOscillator {
    pub fn new(upper_bound: u64) -> Self {
        Self {
            count: 0,
            ascending: true,
            upper_bound,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Advance one tick and return the applied delta (-1, 0 or +1).
    pub fn advance(&mut self) -> i64 {
        if self.ascending && self.count >= self.upper_bound {
            self.ascending = false;
        } else if !self.ascending && self.count == 0 {
            self.ascending = true;
        }

        match self.ascending {
            true if self.count < self.upper_bound => {
                self.count += 1;
                1
            }
            false if self.count > 0 => {
                self.count -= 1;
                -1
            }
            // Only reachable with an upper bound of 0.
            _ => 0,
        }
    }
}

/// Tick-driven generator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorState {
    pub time_alive_ms: u64,
    pub threads: ThreadOscillator,
}

/// Background producer of the synthetic signals.
#[derive(Debug)]
pub struct SyntheticMetricGenerator {
    settings: GeneratorSettings,
    state: GeneratorState,
    time_alive: Instrument,
    threads_active: Instrument,
}

impl SyntheticMetricGenerator {
    /// Register all four signals with `sink`.
    ///
    /// The observable samplers are registered here, once; the tick loop never
    /// touches them.
    pub fn register(
        sink: &Arc<dyn MetricSink>,
        settings: GeneratorSettings,
        labels: Labels,
        testing_id: &str,
    ) -> Self {
        let heap_bound = settings.heap_size_bound;
        register_observable(
            sink,
            SignalDescriptor::new(
                signal_name(TOTAL_HEAP_SIZE, testing_id),
                SignalKind::ObservableUpDownCounter,
                MetricUnit::Bytes,
                "The current total heap size",
            ),
            labels.clone(),
            Box::new(move || sample_heap_size(heap_bound)),
        );

        let threads_active = Instrument::register(
            sink,
            SignalDescriptor::new(
                signal_name(THREADS_ACTIVE, testing_id),
                SignalKind::UpDownCounter,
                MetricUnit::Count,
                "The total amount of threads active",
            ),
            labels.clone(),
        );

        let time_alive = Instrument::register(
            sink,
            SignalDescriptor::new(
                signal_name(TIME_ALIVE, testing_id),
                SignalKind::Counter,
                MetricUnit::Milliseconds,
                "Total amount of time that the application has been alive",
            ),
            labels.clone(),
        );

        let cpu_bound = settings.cpu_usage_bound;
        register_observable(
            sink,
            SignalDescriptor::new(
                signal_name(CPU_USAGE, testing_id),
                SignalKind::ObservableGauge,
                MetricUnit::Count,
                "Cpu usage percent",
            ),
            labels,
            Box::new(move || sample_cpu_usage(cpu_bound)),
        );

        Self {
            settings,
            state: GeneratorState {
                time_alive_ms: 0,
                threads: ThreadOscillator::new(settings.threads_active_bound),
            },
            time_alive,
            threads_active,
        }
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    /// Add one tick's worth of elapsed time; returns the delta in ms.
    pub fn advance_time_alive(&mut self) -> u64 {
        let delta_ms = self.settings.time_alive_increment.saturating_mul(1000);
        self.state.time_alive_ms = self.state.time_alive_ms.saturating_add(delta_ms);
        self.time_alive.add(delta_ms.min(i64::MAX as u64) as i64);
        delta_ms
    }

    /// Step the active-thread oscillator; returns the emitted delta.
    pub fn advance_threads_active(&mut self) -> i64 {
        let delta = self.state.threads.advance();
        if delta != 0 {
            self.threads_active.add(delta);
        }
        delta
    }

    pub fn tick(&mut self) {
        self.advance_time_alive();
        self.advance_threads_active();
    }

    /// Tick until shutdown is signalled.
    pub async fn run(mut self, shutdown: Shutdown) {
        tracing::info!(
            interval_ms = self.settings.interval.as_millis() as u64,
            threads_active_bound = self.settings.threads_active_bound,
            "Synthetic metric generator starting"
        );

        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stopped = shutdown.signaled();
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                    tracing::trace!(
                        time_alive_ms = self.state.time_alive_ms,
                        threads_active = self.state.threads.count(),
                        "Generator tick"
                    );
                }
                _ = &mut stopped => {
                    tracing::info!("Generator received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::MemorySink;

    fn settings(increment: u64, threads_bound: u64) -> GeneratorSettings {
        GeneratorSettings {
            interval: Duration::from_millis(10),
            time_alive_increment: increment,
            cpu_usage_bound: UpperBound::new(CPU_USAGE, 100).unwrap(),
            heap_size_bound: UpperBound::new(TOTAL_HEAP_SIZE, 50).unwrap(),
            threads_active_bound: threads_bound,
        }
    }

    fn generator(increment: u64, threads_bound: u64) -> (Arc<MemorySink>, SyntheticMetricGenerator) {
        let memory = Arc::new(MemorySink::new());
        let sink: Arc<dyn MetricSink> = memory.clone();
        let gen = SyntheticMetricGenerator::register(&sink, settings(increment, threads_bound), Labels::default(), "");
        (memory, gen)
    }

    #[test]
    fn test_oscillator_turns_at_upper_bound() {
        let mut osc = ThreadOscillator::new(10);
        for _ in 0..10 {
            assert_eq!(osc.advance(), 1);
        }
        assert_eq!(osc.count(), 10);
        assert!(osc.is_ascending());

        // Flip and step down happen on the same tick.
        assert_eq!(osc.advance(), -1);
        assert_eq!(osc.count(), 9);
        assert!(!osc.is_ascending());
    }

    #[test]
    fn test_oscillator_turns_at_zero() {
        let mut osc = ThreadOscillator::new(2);
        let deltas: Vec<i64> = (0..6).map(|_| osc.advance()).collect();
        assert_eq!(deltas, vec![1, 1, -1, -1, 1, 1]);
        assert_eq!(osc.count(), 2);
        assert!(osc.is_ascending());
    }

    #[test]
    fn test_oscillator_stays_in_bounds() {
        for bound in 0..8 {
            let mut osc = ThreadOscillator::new(bound);
            for _ in 0..100 {
                osc.advance();
                assert!(osc.count() <= bound);
            }
        }
    }

    #[test]
    fn test_oscillator_zero_bound_is_flat() {
        let mut osc = ThreadOscillator::new(0);
        for _ in 0..5 {
            assert_eq!(osc.advance(), 0);
            assert_eq!(osc.count(), 0);
        }
    }

    #[test]
    fn test_time_alive_advances_in_milliseconds() {
        let (sink, mut gen) = generator(5, 10);
        assert_eq!(gen.advance_time_alive(), 5000);
        assert_eq!(gen.state().time_alive_ms, 5000);
        assert_eq!(sink.sum(TIME_ALIVE), Some(5000));
    }

    #[test]
    fn test_exported_threads_match_oscillator() {
        let (sink, mut gen) = generator(1, 3);
        for _ in 0..17 {
            gen.tick();
            assert_eq!(sink.sum(THREADS_ACTIVE), Some(gen.state().threads.count() as i64));
        }
    }

    #[test]
    fn test_observables_sample_within_bounds() {
        let (sink, _gen) = generator(1, 10);
        assert_eq!(sink.kind(CPU_USAGE), Some(SignalKind::ObservableGauge));
        assert_eq!(sink.kind(TOTAL_HEAP_SIZE), Some(SignalKind::ObservableUpDownCounter));
        for _ in 0..500 {
            assert!((0..100).contains(&sink.observe(CPU_USAGE).unwrap()));
            assert!((0..50).contains(&sink.observe(TOTAL_HEAP_SIZE).unwrap()));
        }
    }

    #[test]
    fn test_failed_registration_degrades() {
        let memory = Arc::new(MemorySink::new());
        let sink: Arc<dyn MetricSink> = memory.clone();
        // Claim the oscillator's name first so its registration fails.
        sink.register(&SignalDescriptor::new(THREADS_ACTIVE, SignalKind::Counter, MetricUnit::Count, "taken"))
            .unwrap();

        let mut gen = SyntheticMetricGenerator::register(&sink, settings(1, 4), Labels::default(), "");
        for _ in 0..3 {
            gen.tick();
        }
        assert_eq!(gen.state().threads.count(), 3);
        assert_eq!(memory.sum(THREADS_ACTIVE), Some(0));
        assert_eq!(memory.sum(TIME_ALIVE), Some(3000));
    }

    #[test]
    fn test_testing_id_suffix_applied() {
        let memory = Arc::new(MemorySink::new());
        let sink: Arc<dyn MetricSink> = memory.clone();
        let _gen = SyntheticMetricGenerator::register(&sink, settings(1, 4), Labels::default(), "run7");
        assert!(memory.kind("timeAlive_run7").is_some());
        assert!(memory.kind("cpuUsage_run7").is_some());
        assert!(memory.kind(TIME_ALIVE).is_none());
    }

    #[tokio::test]
    async fn test_run_ticks_until_shutdown() {
        let (sink, gen) = generator(1, 10);
        let shutdown = Shutdown::new();

        let handle = tokio::spawn(gen.run(shutdown.clone()));
        time::sleep(Duration::from_millis(60)).await;
        shutdown.trigger();

        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("generator did not stop")
            .unwrap();
        assert!(sink.sum(TIME_ALIVE).unwrap() >= 1000);
    }

    #[tokio::test]
    async fn test_run_returns_when_already_shut_down() {
        let (_sink, gen) = generator(1, 10);
        let shutdown = Shutdown::new();
        shutdown.trigger();

        time::timeout(Duration::from_secs(1), gen.run(shutdown))
            .await
            .expect("generator ignored an earlier shutdown");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = GeneratorConfig {
            time_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(GeneratorSettings::from_config(&config), Err(SettingsError::ZeroInterval));
    }

    #[test]
    fn test_zero_sampling_bound_rejected() {
        let config = GeneratorConfig {
            cpu_usage_upper_bound: 0,
            ..Default::default()
        };
        assert_eq!(
            GeneratorSettings::from_config(&config),
            Err(SettingsError::SamplingRange(SamplingRangeError { signal: CPU_USAGE }))
        );
    }
}
