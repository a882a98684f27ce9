//! # Cortex-M4 Port Layer
//!
//! [`Platform`] for STM32F4-class Cortex-M4 parts.
//!
//! ## Tick
//!
//! SysTick fires at `TICK_HZ` and increments a millisecond counter shared
//! with thread mode through an [`IsrCell`]. SysTick keeps running in `wfi`
//! sleep, so sleeps report no unobserved time.
//!
//! ## Watchdog
//!
//! The independent watchdog (IWDG) runs from the ~32 kHz LSI with a /256
//! prescaler, giving 8 ms per reload count and a ceiling of about 32 s.
//! Once started it cannot be stopped: "disabling" it stretches the reload
//! value to the maximum for the duration of a sleep.
//!
//! ## Reset Record
//!
//! The reason for a deliberate reset is stamped into a `.uninit` section
//! that the runtime does not zero, guarded by a magic word. At boot the
//! record is read back and cleared. A watchdog reset leaves no record and
//! is recognized from the RCC reset flags instead.

use core::mem::MaybeUninit;
use core::ptr::{self, addr_of, addr_of_mut};

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};

use super::Platform;
use crate::config::{RESET_REASON_LEN, SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::fault::{Fault, ResetReason};
use crate::sync::IsrCell;
use crate::time::Time;

/// Milliseconds since SysTick was configured.
static MILLIS: IsrCell<u32> = IsrCell::new(0);

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure SysTick to fire at `TICK_HZ` from the processor clock.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// SysTick exception handler: advances the millisecond tick.
#[no_mangle]
pub extern "C" fn SysTick() {
    MILLIS.update(|ms| ms.wrapping_add(1));
}

// ---------------------------------------------------------------------------
// Independent watchdog (IWDG)
// ---------------------------------------------------------------------------

const IWDG_BASE: usize = 0x4000_3000;
const IWDG_KR: *mut u32 = IWDG_BASE as *mut u32;
const IWDG_PR: *mut u32 = (IWDG_BASE + 0x04) as *mut u32;
const IWDG_RLR: *mut u32 = (IWDG_BASE + 0x08) as *mut u32;
const IWDG_SR: *const u32 = (IWDG_BASE + 0x0C) as *const u32;

const KEY_UNLOCK: u32 = 0x5555;
const KEY_RELOAD: u32 = 0xAAAA;
const KEY_START: u32 = 0xCCCC;

/// PR value selecting the /256 prescaler.
const PRESCALER_DIV256: u32 = 6;
const MS_PER_COUNT: u32 = 8;
const RELOAD_MAX: u32 = 0x0FFF;

/// Start the IWDG (which also starts the LSI) and load a new reload value.
///
/// PVU/RVU only clear once the LSI runs, so `KEY_START` comes first.
fn iwdg_program(reload: u32) {
    unsafe {
        ptr::write_volatile(IWDG_KR, KEY_START);
        ptr::write_volatile(IWDG_KR, KEY_UNLOCK);
        ptr::write_volatile(IWDG_PR, PRESCALER_DIV256);
        ptr::write_volatile(IWDG_RLR, reload);
        // PVU | RVU: wait for the LSI domain to latch the new values.
        while ptr::read_volatile(IWDG_SR) & 0b11 != 0 {}
        ptr::write_volatile(IWDG_KR, KEY_RELOAD);
    }
}

// ---------------------------------------------------------------------------
// Reset record
// ---------------------------------------------------------------------------

/// RCC control/status register: reset flags.
const RCC_CSR: *mut u32 = 0x4002_3874 as *mut u32;
const RCC_CSR_RMVF: u32 = 1 << 24;
const RCC_CSR_IWDGRSTF: u32 = 1 << 29;

const RECORD_MAGIC: u32 = 0x5253_4554;

#[repr(C)]
struct ResetRecord {
    magic: u32,
    reason: [u8; RESET_REASON_LEN],
}

#[link_section = ".uninit.actorlite.reset"]
static mut RESET_RECORD: MaybeUninit<ResetRecord> = MaybeUninit::uninit();

/// Read and clear the reset record and the RCC reset flags.
fn take_reset_reason() -> Option<ResetReason> {
    unsafe {
        let record = addr_of_mut!(RESET_RECORD) as *mut ResetRecord;
        let magic = ptr::read_volatile(addr_of!((*record).magic));
        let reason = ptr::read_volatile(addr_of!((*record).reason));
        ptr::write_volatile(addr_of_mut!((*record).magic), 0);

        let csr = ptr::read_volatile(RCC_CSR);
        ptr::write_volatile(RCC_CSR, csr | RCC_CSR_RMVF);

        if magic == RECORD_MAGIC {
            ResetReason::from_record(&reason)
        } else if csr & RCC_CSR_IWDGRSTF != 0 {
            Some(Fault::Watchdog.reason())
        } else {
            None
        }
    }
}

/// Stamp `reason` into the reset record and reset the core.
///
/// Usable before a [`CortexM4`] exists, e.g. from the HardFault handler or
/// the allocator's fault hook.
pub fn system_reset(reason: ResetReason) -> ! {
    unsafe {
        let record = addr_of_mut!(RESET_RECORD) as *mut ResetRecord;
        ptr::write_volatile(addr_of_mut!((*record).reason), reason.to_record());
        ptr::write_volatile(addr_of_mut!((*record).magic), RECORD_MAGIC);
    }
    SCB::sys_reset()
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// The STM32F4 board.
pub struct CortexM4 {
    last_reset: Option<ResetReason>,
}

impl CortexM4 {
    /// Start the tick and collect the previous reset reason. Call once, early
    /// in `main`.
    pub fn new(syst: &mut SYST) -> Self {
        configure_systick(syst);
        Self {
            last_reset: take_reset_reason(),
        }
    }
}

impl Platform for CortexM4 {
    fn now(&self) -> Time {
        Time::millis(MILLIS.get())
    }

    fn sleep(&self, period: Time) -> Time {
        let start = self.now();
        while self.now() - start < period {
            cortex_m::asm::wfi();
        }
        Time::ZERO
    }

    fn watchdog_enable(&self, timeout: Time) {
        let reload = (timeout.as_millis() / MS_PER_COUNT).clamp(1, RELOAD_MAX);
        iwdg_program(reload);
    }

    fn watchdog_disable(&self) {
        iwdg_program(RELOAD_MAX);
    }

    fn watchdog_feed(&self) {
        unsafe { ptr::write_volatile(IWDG_KR, KEY_RELOAD) };
    }

    fn reset(&self, reason: ResetReason) -> ! {
        system_reset(reason)
    }

    fn last_reset_reason(&self) -> Option<ResetReason> {
        self.last_reset
    }
}
