//! # Architecture Abstraction Layer
//!
//! The runtime needs five things from the board: a millisecond clock, a
//! low-power sleep, a watchdog, a way to reset, and the record of why the
//! last reset happened. [`Platform`] is that boundary.
//!
//! - `cortex_m4`: the STM32F4 / Cortex-M4 port (target builds only)
//! - [`sim`]: a host simulator with a hand-cranked clock, used by tests
//!
//! Methods take `&self`: hardware ports talk to memory-mapped registers and
//! the simulator keeps its state in cells.

use crate::fault::ResetReason;
use crate::time::Time;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m4;
pub mod sim;

/// Board services used by the scheduler.
pub trait Platform {
    /// Hardware millisecond tick.
    fn now(&self) -> Time;

    /// Enter low-power sleep for about `period`.
    ///
    /// Returns the part of the elapsed time that [`Platform::now`] did *not*
    /// see. A port whose tick keeps counting while asleep returns
    /// [`Time::ZERO`]; a port whose tick halts (deep sleep timed by the
    /// watchdog oscillator) returns what it actually slept, and the scheduler
    /// adds it back onto logical time.
    fn sleep(&self, period: Time) -> Time;

    /// Arm the watchdog with `timeout`.
    fn watchdog_enable(&self, timeout: Time);

    /// Disarm the watchdog for the duration of a sleep.
    fn watchdog_disable(&self);

    /// Acknowledge the watchdog.
    fn watchdog_feed(&self);

    /// Stamp `reason` into memory that survives reset, then reset.
    fn reset(&self, reason: ResetReason) -> !;

    /// Reason recorded by the previous reset, if there was one.
    fn last_reset_reason(&self) -> Option<ResetReason>;
}
