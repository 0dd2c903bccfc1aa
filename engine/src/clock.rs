//! # Injected Time
//!
//! Ledger timestamps are plain `u64` seconds-since-epoch, and the ledgers
//! never read the wall clock themselves — they are handed a `now` that the
//! orchestrator obtained from an injected [`Clock`]. That keeps fifty-year
//! accrual scenarios runnable in microseconds and makes every accrual test
//! exact instead of "within a few seconds".

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// A source of the current time in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time. Must be monotone non-decreasing across
    /// calls within one vault's lifetime.
    fn now(&self) -> u64;
}

/// The production clock: wall time via `chrono`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// A hand-cranked clock for tests and deterministic simulation.
///
/// Starts at an arbitrary instant and only moves when told to. Shared
/// between the test driver and the vault via `Arc`.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at `start` seconds since epoch.
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Advances the clock by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_where_told() {
        let clock = ManualClock::new(1_700_000_000);
        assert_eq!(clock.now(), 1_700_000_000);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now(), 150);
        clock.advance(0);
        assert_eq!(clock.now(), 150);
    }

    #[test]
    fn system_clock_is_past_2024() {
        // Sanity: wall time on any machine running these tests.
        assert!(SystemClock.now() > 1_704_067_200);
    }
}
