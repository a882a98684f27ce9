//! # Time
//!
//! Millisecond time values used for every deadline in the runtime.
//!
//! [`Time`] is a plain `u32` millisecond count. Arithmetic wraps like
//! unsigned integer arithmetic (after ~49.7 days of uptime); comparison is
//! plain integer comparison. Two sentinels carry meaning in the scheduler:
//!
//! - [`Time::ZERO`]: "ready now", and "work happened this sweep"
//! - [`Time::MAX`]: "no deadline known yet"

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A monotonic millisecond count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u32);

impl Time {
    /// The "ready now" sentinel.
    pub const ZERO: Time = Time(0);

    /// The "no deadline" sentinel.
    pub const MAX: Time = Time(u32::MAX);

    pub const fn millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn seconds(s: u32) -> Self {
        Self::millis(s.wrapping_mul(1000))
    }

    pub const fn minutes(m: u32) -> Self {
        Self::seconds(m.wrapping_mul(60))
    }

    pub const fn hours(h: u32) -> Self {
        Self::minutes(h.wrapping_mul(60))
    }

    #[inline]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_secs(self) -> u32 {
        self.0 / 1000
    }

    #[inline]
    pub const fn as_minutes(self) -> u32 {
        self.0 / (1000 * 60)
    }

    #[inline]
    pub const fn as_hours(self) -> u32 {
        self.0 / (1000 * 60 * 60)
    }

    /// A time is "valid" when it has been set to something other than zero.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Add for Time {
    type Output = Time;

    #[inline]
    fn add(self, rhs: Time) -> Time {
        Time(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Time {
    type Output = Time;

    #[inline]
    fn sub(self, rhs: Time) -> Time {
        Time(self.0.wrapping_sub(rhs.0))
    }
}

impl AddAssign for Time {
    #[inline]
    fn add_assign(&mut self, rhs: Time) {
        *self = *self + rhs;
    }
}

impl SubAssign for Time {
    #[inline]
    fn sub_assign(&mut self, rhs: Time) {
        *self = *self - rhs;
    }
}

impl Mul<u32> for Time {
    type Output = Time;

    #[inline]
    fn mul(self, rhs: u32) -> Time {
        Time(self.0.wrapping_mul(rhs))
    }
}

impl From<Time> for core::time::Duration {
    fn from(time: Time) -> Self {
        core::time::Duration::from_millis(u64::from(time.0))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_constructors() {
        assert_eq!(Time::seconds(2).as_millis(), 2_000);
        assert_eq!(Time::minutes(3).as_secs(), 180);
        assert_eq!(Time::hours(1).as_minutes(), 60);
        assert_eq!(Time::hours(5).as_hours(), 5);
    }

    #[test]
    fn test_sentinels_order() {
        assert!(Time::ZERO < Time::millis(1));
        assert!(Time::millis(1) < Time::MAX);
        assert!(!Time::ZERO.is_valid());
        assert!(Time::millis(7).is_valid());
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(Time::MAX + Time::millis(1), Time::ZERO);
        assert_eq!(Time::ZERO - Time::millis(1), Time::MAX);
        assert_eq!(Time::millis(250) * 4, Time::seconds(1));

        let mut t = Time::millis(10);
        t += Time::millis(5);
        t -= Time::millis(3);
        assert_eq!(t, Time::millis(12));
    }

    #[test]
    fn test_duration_conversion() {
        let d: core::time::Duration = Time::millis(1500).into();
        assert_eq!(d.as_millis(), 1500);
    }
}
