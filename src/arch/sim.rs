//! # Host Simulator
//!
//! A [`Platform`] for running the scheduler off-target. The clock only moves
//! when told to: by [`SimPlatform::advance`], or by a sleep.
//!
//! Two sleep models are available:
//!
//! - [`SleepModel::Ticking`]: the tick keeps counting while asleep (like a
//!   `wfi` loop with SysTick running); sleeps advance the clock and report
//!   nothing unobserved
//! - [`SleepModel::Halted`]: the tick stops in deep sleep; the clock stays
//!   put and the whole period is reported back as unobserved time
//!
//! Every sleep request and watchdog operation is recorded for inspection.
//! [`Platform::reset`] panics with the reason.

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use super::Platform;
use crate::fault::ResetReason;
use crate::time::Time;

/// What happens to the tick counter during a sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepModel {
    Ticking,
    Halted,
}

/// Watchdog state as seen by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Disabled,
    Armed(Time),
}

pub struct SimPlatform {
    now: Cell<Time>,
    model: SleepModel,
    sleeps: RefCell<Vec<Time>>,
    sleep_watchdog: RefCell<Vec<WatchdogState>>,
    watchdog: Cell<WatchdogState>,
    feeds: Cell<u32>,
    last_reset: Option<ResetReason>,
}

impl SimPlatform {
    /// A simulator at t=0 whose tick keeps counting during sleep.
    pub fn new() -> Self {
        Self::with_model(SleepModel::Ticking)
    }

    pub fn with_model(model: SleepModel) -> Self {
        Self {
            now: Cell::new(Time::ZERO),
            model,
            sleeps: RefCell::new(Vec::new()),
            sleep_watchdog: RefCell::new(Vec::new()),
            watchdog: Cell::new(WatchdogState::Disabled),
            feeds: Cell::new(0),
            last_reset: None,
        }
    }

    /// Pretend the previous boot ended with `reason`.
    pub fn with_last_reset(mut self, reason: ResetReason) -> Self {
        self.last_reset = Some(reason);
        self
    }

    /// Move the clock forward, as if handlers or the world took `time`.
    pub fn advance(&self, time: Time) {
        self.now.set(self.now.get() + time);
    }

    pub fn set_now(&self, now: Time) {
        self.now.set(now);
    }

    /// Every sleep period requested so far, oldest first.
    pub fn sleeps(&self) -> Vec<Time> {
        self.sleeps.borrow().clone()
    }

    /// Watchdog state at the start of each sleep, oldest first.
    pub fn watchdog_during_sleeps(&self) -> Vec<WatchdogState> {
        self.sleep_watchdog.borrow().clone()
    }

    pub fn watchdog(&self) -> WatchdogState {
        self.watchdog.get()
    }

    pub fn watchdog_feeds(&self) -> u32 {
        self.feeds.get()
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for SimPlatform {
    fn now(&self) -> Time {
        self.now.get()
    }

    fn sleep(&self, period: Time) -> Time {
        self.sleeps.borrow_mut().push(period);
        self.sleep_watchdog.borrow_mut().push(self.watchdog.get());
        match self.model {
            SleepModel::Ticking => {
                self.advance(period);
                Time::ZERO
            }
            SleepModel::Halted => period,
        }
    }

    fn watchdog_enable(&self, timeout: Time) {
        self.watchdog.set(WatchdogState::Armed(timeout));
    }

    fn watchdog_disable(&self) {
        self.watchdog.set(WatchdogState::Disabled);
    }

    fn watchdog_feed(&self) {
        self.feeds.set(self.feeds.get() + 1);
    }

    fn reset(&self, reason: ResetReason) -> ! {
        panic!("system reset: {}", reason)
    }

    fn last_reset_reason(&self) -> Option<ResetReason> {
        self.last_reset
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticking_sleep_advances_clock() {
        let sim = SimPlatform::new();
        assert_eq!(sim.sleep(Time::millis(40)), Time::ZERO);
        assert_eq!(sim.now(), Time::millis(40));
        assert_eq!(sim.sleeps(), [Time::millis(40)]);
    }

    #[test]
    fn test_halted_sleep_reports_unobserved_time() {
        let sim = SimPlatform::with_model(SleepModel::Halted);
        assert_eq!(sim.sleep(Time::millis(40)), Time::millis(40));
        assert_eq!(sim.now(), Time::ZERO);
    }

    #[test]
    fn test_watchdog_bookkeeping() {
        let sim = SimPlatform::new();
        sim.watchdog_enable(Time::seconds(8));
        assert_eq!(sim.watchdog(), WatchdogState::Armed(Time::seconds(8)));
        sim.watchdog_feed();
        sim.watchdog_feed();
        assert_eq!(sim.watchdog_feeds(), 2);
        sim.watchdog_disable();
        assert_eq!(sim.watchdog(), WatchdogState::Disabled);
        sim.sleep(Time::millis(5));
        assert_eq!(sim.watchdog_during_sleeps(), [WatchdogState::Disabled]);
    }

    #[test]
    #[should_panic(expected = "system reset: CMD")]
    fn test_reset_panics_with_reason() {
        SimPlatform::new().reset(ResetReason::truncated("CMD"));
    }
}
