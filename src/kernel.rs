//! # Kernel
//!
//! Top-level boot and main loop.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► CortexM4::new()        ← Start the tick, read the reset record
//!         ├─► kernel::boot()         ← Report the last reset, arm the watchdog
//!         ├─► Scheduler::register()  ← Add actors (×N), each gets Bootstrap
//!         └─► kernel::run()          ← Sweep forever (no return)
//! ```

use log::info;

use crate::arch::Platform;
use crate::power::PowerPolicy;
use crate::scheduler::Scheduler;

/// Create the scheduler for `platform`.
///
/// Logs why the board last reset, then arms the watchdog with the policy's
/// timeout. Register actors on the returned scheduler before calling
/// [`run`].
pub fn boot(platform: &dyn Platform, policy: PowerPolicy) -> Scheduler<'_> {
    match platform.last_reset_reason() {
        Some(reason) => info!("boot (last reset: {})", reason),
        None => info!("boot"),
    }
    Scheduler::new(platform, policy)
}

/// Sweep forever. **Does not return.**
///
/// Sleeping happens inside each sweep; a stuck handler is caught by the
/// watchdog.
pub fn run(scheduler: &Scheduler<'_>) -> ! {
    loop {
        scheduler.run();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::sim::{SimPlatform, WatchdogState};
    use crate::fault::ResetReason;
    use crate::time::Time;

    #[test]
    fn test_boot_arms_watchdog() {
        let sim = SimPlatform::new().with_last_reset(ResetReason::truncated("WDT"));
        let sched = boot(&sim, PowerPolicy::new());
        assert_eq!(sim.watchdog(), WatchdogState::Armed(Time::millis(8000)));
        assert_eq!(sched.actor_count(), 0);
        assert_eq!(
            sched.platform().last_reset_reason(),
            Some(ResetReason::truncated("WDT"))
        );
    }
}
