//! Bounded uniform sampling.

use std::fmt;

use rand::Rng;
use thiserror::Error;

/// Upper bound of 0 gives an empty `[0, 0)` range.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("upper bound for '{signal}' must be greater than 0")]
pub struct SamplingRangeError {
    pub signal: &'static str,
}

/// Exclusive upper bound of a non-empty sampling range `[0, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpperBound(u64);

impl UpperBound {
    pub fn new(signal: &'static str, value: u64) -> Result<Self, SamplingRangeError> {
        if value == 0 {
            return Err(SamplingRangeError { signal });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Range for bytes reported per completed call.
pub const BYTES_SENT_BOUND: UpperBound = UpperBound(1024);

/// Range for latency samples in milliseconds.
pub const LATENCY_BOUND: UpperBound = UpperBound(512);

/// Uniform integer in `[0, bound)`.
pub fn sample_below<R: Rng + ?Sized>(rng: &mut R, bound: UpperBound) -> i64 {
    rng.gen_range(0..bound.0) as i64
}

/// Synthetic CPU usage observation.
pub fn sample_cpu_usage(bound: UpperBound) -> i64 {
    sample_below(&mut rand::thread_rng(), bound)
}

/// Synthetic heap size observation.
pub fn sample_heap_size(bound: UpperBound) -> i64 {
    sample_below(&mut rand::thread_rng(), bound)
}
