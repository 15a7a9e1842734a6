//! Meters tracking event rates with exponentially-weighted moving averages.
//!
//! Rates are advanced in 5 second ticks. Instead of a background ticker,
//! elapsed ticks are applied lazily whenever the meter is marked or read.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Interval between EWMA ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Measures the rate of events.
pub trait MeterStat: Send + Sync {
    /// Record `n` events
    fn mark(&self, n: i64);
    /// Point-in-time copy of the rates
    fn snapshot(&self) -> MeterSnapshot;
}

/// Immutable view of a meter. Rates are events per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterSnapshot {
    pub count: i64,
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    pub rate_mean: f64,
}

/// Exponentially-weighted moving average over [`TICK_INTERVAL`] ticks.
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// EWMA that decays over `minutes`
    pub fn with_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();
        Self {
            alpha,
            rate: 0.0,
            initialized: false,
        }
    }

    /// Advance by `ticks` intervals; `uncounted` events landed in the first one.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn tick(&mut self, uncounted: i64, ticks: u64) {
        if ticks == 0 {
            return;
        }

        let instant = uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant - self.rate);
        } else {
            self.rate = instant;
            self.initialized = true;
        }

        // Remaining ticks saw no events and only decay the rate.
        let idle = ticks - 1;
        if idle > 0 {
            let exp = i32::try_from(idle).unwrap_or(i32::MAX);
            self.rate *= (1.0 - self.alpha).powi(exp);
        }
    }

    /// Current rate in events per second
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

#[derive(Debug)]
struct MeterState {
    uncounted: i64,
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl MeterState {
    fn catch_up(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / TICK_INTERVAL.as_nanos()) as u64;
        if ticks == 0 {
            return;
        }

        let uncounted = std::mem::take(&mut self.uncounted);
        self.m1.tick(uncounted, ticks);
        self.m5.tick(uncounted, ticks);
        self.m15.tick(uncounted, ticks);
        let advance = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.last_tick += TICK_INTERVAL.saturating_mul(advance);
    }
}

/// Meter with 1, 5 and 15 minute moving rates plus the mean rate.
#[derive(Debug)]
pub struct StandardMeter {
    count: AtomicI64,
    start: Instant,
    state: Mutex<MeterState>,
}

impl StandardMeter {
    /// Create a meter starting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(start: Instant) -> Self {
        Self {
            count: AtomicI64::new(0),
            start,
            state: Mutex::new(MeterState {
                uncounted: 0,
                last_tick: start,
                m1: Ewma::with_minutes(1.0),
                m5: Ewma::with_minutes(5.0),
                m15: Ewma::with_minutes(15.0),
            }),
        }
    }
}

impl Default for StandardMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterStat for StandardMeter {
    fn mark(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
        let mut state = self.state.lock();
        state.catch_up(Instant::now());
        state.uncounted += n;
    }

    #[allow(clippy::cast_precision_loss)]
    fn snapshot(&self) -> MeterSnapshot {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.catch_up(now);

        let count = self.count.load(Ordering::Relaxed);
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let rate_mean = if elapsed > 0.0 {
            count as f64 / elapsed
        } else {
            0.0
        };

        MeterSnapshot {
            count,
            rate1: state.m1.rate(),
            rate5: state.m5.rate(),
            rate15: state.m15.rate(),
            rate_mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ewma_first_tick_sets_rate() {
        let mut ewma = Ewma::with_minutes(1.0);
        ewma.tick(15, 1);
        assert!((ewma.rate() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ewma_decays_while_idle() {
        let mut ewma = Ewma::with_minutes(1.0);
        ewma.tick(15, 1);
        let before = ewma.rate();
        ewma.tick(0, 12);
        assert!(ewma.rate() < before);
        assert!(ewma.rate() > 0.0);
    }

    #[test]
    fn test_ewma_catch_up_matches_single_ticks() {
        let mut stepped = Ewma::with_minutes(5.0);
        stepped.tick(10, 1);
        for _ in 0..4 {
            stepped.tick(0, 1);
        }

        let mut batched = Ewma::with_minutes(5.0);
        batched.tick(10, 1);
        batched.tick(0, 4);

        assert!((stepped.rate() - batched.rate()).abs() < 1e-12);
    }

    #[test]
    fn test_meter_count_and_mean() {
        let meter = StandardMeter::new();
        meter.mark(5);
        meter.mark(2);
        let snap = meter.snapshot();
        assert_eq!(snap.count, 7);
        assert!(snap.rate_mean > 0.0);
        // no full tick has elapsed yet
        assert_eq!(snap.rate1, 0.0);
    }

    #[test]
    fn test_meter_rates_after_tick() {
        let start = Instant::now() - TICK_INTERVAL;
        let meter = StandardMeter::starting_at(start);
        meter.state.lock().uncounted = 10;
        meter.count.store(10, Ordering::Relaxed);

        let snap = meter.snapshot();
        assert!((snap.rate1 - 2.0).abs() < 1e-9);
        assert!((snap.rate5 - 2.0).abs() < 1e-9);
        assert!((snap.rate15 - 2.0).abs() < 1e-9);
    }
}
