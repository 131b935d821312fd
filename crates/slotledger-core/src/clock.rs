//! Time source and day derivation
//!
//! Every component that reasons about days goes through [`day_index`]; mint,
//! cancellation and redemption must agree on the exact same boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Day;

/// Seconds in one booking day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Day index containing `timestamp` (unix seconds)
pub const fn day_index(timestamp: u64) -> Day {
    timestamp / SECONDS_PER_DAY
}

/// First second of `day`, saturating at `u64::MAX`
pub const fn day_start(day: Day) -> u64 {
    day.saturating_mul(SECONDS_PER_DAY)
}

/// Supplies the current instant in unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;

    fn today(&self) -> Day {
        day_index(self.now())
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock shared between a ledger and whoever drives it
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    /// Clock positioned at the start of `day`
    pub fn at_day(day: Day) -> Self {
        Self::new(day_start(day))
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn set_day(&self, day: Day) {
        self.set(day_start(day));
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
