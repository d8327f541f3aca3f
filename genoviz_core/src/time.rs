// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time for driving transitions.
//!
//! [`HostTime`] is a point on the host's monotonic clock in microseconds
//! (browser hosts convert `performance.now()` milliseconds). [`Duration`]
//! uses the same unit. Transition progress is computed with
//! [`Duration::progress`].

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time as monotonic microseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw microsecond value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Creates a host time from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1000))
    }

    /// Creates a host time from fractional milliseconds, as reported by
    /// `performance.now()`. Negative and non-finite inputs map to zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "sub-microsecond precision is not needed for transitions"
    )]
    pub fn from_millis_f64(millis: f64) -> Self {
        if millis.is_finite() && millis > 0.0 {
            Self((millis * 1000.0) as u64)
        } else {
            Self(0)
        }
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}µs)", self.0)
    }
}

/// A span of time in microseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1000))
    }

    /// Returns the raw microsecond value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Returns the fraction of this duration elapsed between `start` and
    /// `now`, clamped to `[0, 1]`. A zero duration is always complete.
    #[must_use]
    pub fn progress(self, start: HostTime, now: HostTime) -> f64 {
        if self.0 == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(start).0;
        (elapsed as f64 / self.0 as f64).clamp(0.0, 1.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}µs)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_conversions() {
        assert_eq!(HostTime::from_millis(2).micros(), 2000);
        assert_eq!(HostTime::from_millis_f64(1.5).micros(), 1500);
        assert_eq!(HostTime::from_millis_f64(-3.0), HostTime(0), "negative clamps");
        assert_eq!(HostTime::from_millis_f64(f64::NAN), HostTime(0), "NaN clamps");
    }

    #[test]
    fn progress_is_clamped() {
        let d = Duration::from_millis(100);
        let start = HostTime::from_millis(1000);
        assert_eq!(d.progress(start, HostTime::from_millis(900)), 0.0);
        assert_eq!(d.progress(start, HostTime::from_millis(1050)), 0.5);
        assert_eq!(d.progress(start, HostTime::from_millis(5000)), 1.0);
        assert_eq!(Duration::ZERO.progress(start, start), 1.0, "zero duration completes");
    }

    #[test]
    fn host_time_arithmetic_saturates() {
        let t = HostTime(1000);
        assert_eq!(t + Duration(200), HostTime(1200));
        assert_eq!(t - HostTime(400), Duration(600));
        assert_eq!(t - HostTime(1500), Duration::ZERO);
    }
}
