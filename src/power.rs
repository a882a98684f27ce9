//! # Power Policy
//!
//! Decides how long the system may sleep once a sweep finds nothing to do,
//! and performs the sleep with the watchdog out of the way.
//!
//! ## Sleep Decision
//!
//! Given the earliest pending deadline `next_event` and logical `now`:
//!
//! 1. The natural sleep is `next_event - now`, or zero if already due
//! 2. In application sleeping mode it is raised to `min_sleep_period`, so a
//!    system told to conserve power never spins at high frequency
//! 3. Anything still below `min_sleep_period` is not worth sleeping for:
//!    the scheduler sweeps again instead
//! 4. Otherwise the sleep is capped at `max_sleep_period`
//!
//! An empty system (`next_event == Time::MAX`) therefore wakes every
//! `max_sleep_period`.

use log::trace;

use crate::arch::Platform;
use crate::config::{DEFAULT_MAX_SLEEP_MS, DEFAULT_MIN_SLEEP_MS, DEFAULT_WATCHDOG_TIMEOUT_MS};
use crate::time::Time;

/// Sleep bounds and watchdog timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerPolicy {
    /// Shortest sleep worth entering.
    pub min_sleep_period: Time,
    /// Longest single sleep.
    pub max_sleep_period: Time,
    /// Watchdog timeout while awake.
    pub watchdog_timeout: Time,
}

impl PowerPolicy {
    /// The compile-time defaults from [`crate::config`].
    pub const fn new() -> Self {
        Self {
            min_sleep_period: Time::millis(DEFAULT_MIN_SLEEP_MS),
            max_sleep_period: Time::millis(DEFAULT_MAX_SLEEP_MS),
            watchdog_timeout: Time::millis(DEFAULT_WATCHDOG_TIMEOUT_MS),
        }
    }

    pub const fn with_min_sleep(mut self, period: Time) -> Self {
        self.min_sleep_period = period;
        self
    }

    pub const fn with_max_sleep(mut self, period: Time) -> Self {
        self.max_sleep_period = period;
        self
    }

    pub const fn with_watchdog_timeout(mut self, timeout: Time) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    /// How long to sleep until `next_event`, or `None` to keep sweeping.
    pub fn sleep_period(&self, next_event: Time, now: Time, sleeping: bool) -> Option<Time> {
        let mut period = if next_event > now {
            next_event - now
        } else {
            Time::ZERO
        };
        if sleeping && period < self.min_sleep_period {
            period = self.min_sleep_period;
        }
        if period < self.min_sleep_period {
            return None;
        }
        Some(period.min(self.max_sleep_period))
    }

    /// Sleep for `period` with the watchdog disarmed.
    ///
    /// Returns the time the platform's tick did not observe, to be added to
    /// the scheduler's sleep accumulator.
    pub fn enter_low_power(&self, platform: &dyn Platform, period: Time) -> Time {
        platform.watchdog_disable();
        let unobserved = platform.sleep(period);
        platform.watchdog_enable(self.watchdog_timeout);
        trace!("slept {} ({} unobserved)", period, unobserved);
        unobserved
    }
}

impl Default for PowerPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
