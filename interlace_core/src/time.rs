// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time.
//!
//! [`HostTime`] is a reading of the host's monotonic clock in backend-defined
//! ticks (nanoseconds for the std backend, microseconds for the web backend).
//! [`Timebase`] converts ticks to nanoseconds as `ticks * numer / denom`.
//! [`Duration`] is a span in the same tick units.
//!
//! Conversions go through `u128` so they cannot overflow.

use core::fmt;

/// A point in time expressed as monotonic host ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if the clock went backwards.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// The denominator is never zero; [`Timebase::new`] is the only way to build
/// one from raw parts.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    numer: u32,
    denom: u32,
}

impl Timebase {
    /// One tick per nanosecond.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// One tick per microsecond.
    pub const MICROS: Self = Self {
        numer: 1_000,
        denom: 1,
    };

    /// Creates a timebase.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Numerator of the ticks-to-nanoseconds ratio.
    #[inline]
    #[must_use]
    pub const fn numer(self) -> u32 {
        self.numer
    }

    /// Denominator of the ticks-to-nanoseconds ratio. Never zero.
    #[inline]
    #[must_use]
    pub const fn denom(self) -> u32 {
        self.denom
    }

    /// Converts a tick count to nanoseconds, saturating at `u64::MAX`.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "range checked against u64::MAX before narrowing"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        if wide > u64::MAX as u128 {
            u64::MAX
        } else {
            wide as u64
        }
    }

    /// Converts nanoseconds to a tick count, saturating at `u64::MAX`.
    ///
    /// Returns `u64::MAX` for a zero numerator.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "range checked against u64::MAX before narrowing"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        if self.numer == 0 {
            return u64::MAX;
        }
        let wide = nanos as u128 * self.denom as u128 / self.numer as u128;
        if wide > u64::MAX as u128 {
            u64::MAX
        } else {
            wide as u64
        }
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A span of host ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts to nanoseconds.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Converts to fractional milliseconds, for display.
    #[inline]
    #[must_use]
    pub fn to_millis_f64(self, timebase: Timebase) -> f64 {
        self.to_nanos(timebase) as f64 / 1_000_000.0
    }

    /// Creates a duration from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }
}
