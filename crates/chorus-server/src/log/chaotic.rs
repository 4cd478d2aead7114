//! Chaotic log wrapper for fault injection testing
//!
//! Wraps a real log and randomly fails operations, proving that a broken
//! chat log never stops delivery to clients.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use super::{LogError, LogSink};

/// Log wrapper that randomly injects failures
///
/// Delegates to an underlying log but fails a configured fraction of
/// operations with [`LogError::Injected`]. Failed appends are NOT forwarded.
#[derive(Clone)]
pub struct ChaoticLog<L: LogSink> {
    inner: L,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operations attempted, failed or not
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator, so chaos runs are reproducible per seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<L: LogSink> ChaoticLog<L> {
    /// Create a chaotic wrapper with the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: L, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: L, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying log (for checking what actually got stored).
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Total number of operations attempted.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    fn should_fail(&self) -> bool {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).next() < self.failure_rate
    }
}

impl<L: LogSink> LogSink for ChaoticLog<L> {
    fn append(&self, line: &str) -> Result<(), LogError> {
        if self.should_fail() {
            return Err(LogError::Injected);
        }
        self.inner.append(line)
    }

    fn all(&self) -> Result<Vec<String>, LogError> {
        if self.should_fail() {
            return Err(LogError::Injected);
        }
        self.inner.all()
    }

    fn clear(&self) -> Result<(), LogError> {
        if self.should_fail() {
            return Err(LogError::Injected);
        }
        self.inner.clear()
    }
}
