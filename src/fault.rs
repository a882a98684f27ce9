//! # Faults and Reset Reasons
//!
//! Nothing in the dispatch path returns an error: a wedged handler is caught
//! by the watchdog, and resource exhaustion escalates to a full system reset.
//! This module holds the small vocabulary those paths share:
//!
//! - [`Fault`]: why the system is about to reset
//! - [`ResetReason`]: the short ASCII code stamped into memory that survives
//!   the reset, so a diagnostics actor can report it after reboot
//! - [`Error`]: the few configuration-time failures that *are* returned
//!   as `Result`

use core::fmt;

use thiserror::Error;

use crate::config::RESET_REASON_LEN;

/// Configuration-time errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Every slot of the actor registry is taken (see `config::MAX_ACTORS`).
    #[error("actor registry is full")]
    RegistryFull,

    /// A reset reason does not fit in the no-init record.
    #[error("reset reason of {0} bytes does not fit the no-init record")]
    ReasonTooLong(usize),

    /// A reset reason contains bytes outside printable ASCII.
    #[error("reset reason must be printable ASCII")]
    ReasonNotAscii,
}

/// Fatal conditions that end in a system reset.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The allocator could not satisfy a request.
    #[error("out of memory")]
    OutOfMemory,

    /// A guard band around a heap block was overwritten.
    #[error("heap guard band corrupted")]
    HeapCorruption,

    /// The hardware watchdog expired (reported after reboot).
    #[error("watchdog expired")]
    Watchdog,

    /// The CPU took a hard fault.
    #[error("hard fault")]
    HardFault,

    /// An application actor asked for the reset.
    #[error("reset requested: {0}")]
    Requested(ResetReason),
}

impl Fault {
    /// The reason code stamped into the no-init record.
    pub fn reason(&self) -> ResetReason {
        match self {
            Fault::OutOfMemory => ResetReason::truncated("Memory"),
            Fault::HeapCorruption => ResetReason::truncated("HEAP"),
            Fault::Watchdog => ResetReason::truncated("WDT"),
            Fault::HardFault => ResetReason::truncated("HFAULT"),
            Fault::Requested(reason) => *reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Reset reason
// ---------------------------------------------------------------------------

/// A short printable-ASCII code describing the last reset.
///
/// Sized to the no-init record ([`RESET_REASON_LEN`] bytes), it is `Copy`
/// and never allocates, so it can be built on the way down from an
/// allocator failure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetReason {
    bytes: [u8; RESET_REASON_LEN],
    len: u8,
}

impl ResetReason {
    /// Build a reason, rejecting input that does not fit or is not printable.
    pub fn new(reason: &str) -> Result<Self, Error> {
        if reason.len() > RESET_REASON_LEN {
            return Err(Error::ReasonTooLong(reason.len()));
        }
        if !reason.bytes().all(is_printable) {
            return Err(Error::ReasonNotAscii);
        }
        Ok(Self::truncated(reason))
    }

    /// Build a reason from the leading printable bytes of `reason`, cutting
    /// at the record size.
    pub fn truncated(reason: &str) -> Self {
        let mut bytes = [0u8; RESET_REASON_LEN];
        let mut len = 0;
        for b in reason.bytes().take_while(|b| is_printable(*b)).take(RESET_REASON_LEN) {
            bytes[len] = b;
            len += 1;
        }
        Self { bytes, len: len as u8 }
    }

    /// Rebuild a reason from a raw record, e.g. one read back after reset.
    /// Returns `None` for anything that is not a plausible code.
    pub fn from_record(record: &[u8; RESET_REASON_LEN]) -> Option<Self> {
        let len = record.iter().position(|b| *b == 0).unwrap_or(RESET_REASON_LEN);
        if len == 0 || !record[..len].iter().copied().all(is_printable) {
            return None;
        }
        let mut bytes = [0u8; RESET_REASON_LEN];
        bytes[..len].copy_from_slice(&record[..len]);
        Some(Self { bytes, len: len as u8 })
    }

    /// The zero-padded record form.
    pub fn to_record(&self) -> [u8; RESET_REASON_LEN] {
        self.bytes
    }

    pub fn as_str(&self) -> &str {
        // Only printable ASCII is ever stored.
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn is_printable(b: u8) -> bool {
    (0x21..0x7f).contains(&b)
}

impl fmt::Debug for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResetReason({:?})", self.as_str())
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
