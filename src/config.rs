//! # actorlite Configuration
//!
//! Compile-time constants governing the scheduler and the board port.
//! All limits are fixed at compile time; runtime tuning of the sleep
//! bounds goes through [`crate::power::PowerPolicy`], which starts from
//! the defaults below.

/// Maximum number of actors the registry can hold.
/// This bounds the static slot array in the scheduler. Each slot costs a
/// handful of words regardless of whether it is used.
pub const MAX_ACTORS: usize = 16;

/// SysTick frequency in Hz. One tick is one millisecond of [`crate::time::Time`].
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Shortest low-power sleep worth entering, in milliseconds.
/// Deadlines closer than this are served by sweeping again instead.
pub const DEFAULT_MIN_SLEEP_MS: u32 = 1;

/// Longest single low-power sleep, in milliseconds. An idle system wakes at
/// least this often even with no deadline pending.
pub const DEFAULT_MAX_SLEEP_MS: u32 = 4_000;

/// Hardware watchdog timeout while the scheduler is sweeping, in milliseconds.
pub const DEFAULT_WATCHDOG_TIMEOUT_MS: u32 = 8_000;

/// Number of bytes kept for the last reset reason (the no-init record).
pub const RESET_REASON_LEN: usize = 7;

/// Heap size handed to the firmware allocator, in bytes.
pub const HEAP_SIZE: usize = 8 * 1024;
