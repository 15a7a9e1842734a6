//! Counters and gauges backed by atomics.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A monotonic or up/down counter.
pub trait CounterStat: Send + Sync {
    /// Add `n` to the counter
    fn inc(&self, n: i64);
    /// Subtract `n` from the counter
    fn dec(&self, n: i64);
    /// Reset the counter to zero
    fn clear(&self);
    /// Current count
    fn count(&self) -> i64;
}

/// A gauge holding an integer value.
pub trait GaugeStat: Send + Sync {
    /// Replace the current value
    fn update(&self, value: i64);
    /// Current value
    fn value(&self) -> i64;
}

/// A gauge holding a floating point value.
pub trait GaugeF64Stat: Send + Sync {
    /// Replace the current value
    fn update(&self, value: f64);
    /// Current value
    fn value(&self) -> f64;
}

/// Lock-free counter
#[derive(Debug, Default)]
pub struct StandardCounter {
    count: AtomicI64,
}

impl StandardCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStat for StandardCounter {
    #[inline]
    fn inc(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    fn dec(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Lock-free integer gauge
#[derive(Debug, Default)]
pub struct StandardGauge {
    value: AtomicI64,
}

impl StandardGauge {
    /// Create a gauge at zero
    pub fn new() -> Self {
        Self::default()
    }
}

impl GaugeStat for StandardGauge {
    #[inline]
    fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Lock-free floating point gauge, stored as raw bits.
#[derive(Debug)]
pub struct StandardGaugeF64 {
    bits: AtomicU64,
}

impl StandardGaugeF64 {
    /// Create a gauge at zero
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0.0f64.to_bits()),
        }
    }
}

impl Default for StandardGaugeF64 {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugeF64Stat for StandardGaugeF64 {
    #[inline]
    fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
