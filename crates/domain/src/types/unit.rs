//! Time units and rounding modes
//!
//! Units are ordered from the smallest ([`TimeUnit::Nanosecond`]) to the
//! largest ([`TimeUnit::Year`]) so that `a < b` reads as "a is a finer unit
//! than b".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Nanoseconds in one microsecond
pub const NANOS_PER_MICRO: i128 = 1_000;
/// Nanoseconds in one millisecond
pub const NANOS_PER_MILLI: i128 = 1_000_000;
/// Nanoseconds in one second
pub const NANOS_PER_SECOND: i128 = 1_000_000_000;
/// Nanoseconds in one minute
pub const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
/// Nanoseconds in one hour
pub const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;
/// Nanoseconds in one (24 hour) day
pub const NANOS_PER_DAY: i128 = 24 * NANOS_PER_HOUR;
/// Nanoseconds in one (7 day) week
pub const NANOS_PER_WEEK: i128 = 7 * NANOS_PER_DAY;

/// Calendar and clock units understood by truncation, addition and diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    /// Every unit, largest first
    pub const ALL: [Self; 10] = [
        Self::Year,
        Self::Month,
        Self::Week,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
        Self::Millisecond,
        Self::Microsecond,
        Self::Nanosecond,
    ];

    /// Canonical singular name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nanosecond => "nanosecond",
            Self::Microsecond => "microsecond",
            Self::Millisecond => "millisecond",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Length of the unit in nanoseconds, `None` for variable-length units
    /// (months and years).
    ///
    /// Days and weeks report their nominal 24h / 7×24h length; calendar-aware
    /// addition of days is handled by [`ZonedInstant::add`](crate::ZonedInstant::add).
    pub const fn fixed_nanos(self) -> Option<i128> {
        match self {
            Self::Nanosecond => Some(1),
            Self::Microsecond => Some(NANOS_PER_MICRO),
            Self::Millisecond => Some(NANOS_PER_MILLI),
            Self::Second => Some(NANOS_PER_SECOND),
            Self::Minute => Some(NANOS_PER_MINUTE),
            Self::Hour => Some(NANOS_PER_HOUR),
            Self::Day => Some(NANOS_PER_DAY),
            Self::Week => Some(NANOS_PER_WEEK),
            Self::Month | Self::Year => None,
        }
    }

    /// Whether addition of this unit follows the local calendar rather than
    /// elapsed time
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::Day | Self::Week | Self::Month | Self::Year)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanosecond" | "nanoseconds" => Self::Nanosecond,
            "us" | "µs" | "microsecond" | "microseconds" => Self::Microsecond,
            "ms" | "millisecond" | "milliseconds" => Self::Millisecond,
            "s" | "sec" | "second" | "seconds" => Self::Second,
            "m" | "min" | "minute" | "minutes" => Self::Minute,
            "h" | "hour" | "hours" => Self::Hour,
            "d" | "day" | "days" | "date" => Self::Day,
            "w" | "week" | "weeks" => Self::Week,
            "mo" | "month" | "months" => Self::Month,
            "y" | "year" | "years" => Self::Year,
            _ => return Err(DomainError::UnknownUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// Rounding applied when a difference is collapsed to a whole unit count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Toward zero
    #[default]
    Trunc,
    /// Toward negative infinity
    Floor,
    /// Toward positive infinity
    Ceil,
    /// To nearest, halves away from zero
    Round,
}

impl RoundingMode {
    /// Canonical lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trunc => "trunc",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
        }
    }

    /// Round a floating point quantity
    pub fn apply(self, value: f64) -> f64 {
        let rounded = match self {
            Self::Trunc => value.trunc(),
            Self::Floor => value.floor(),
            Self::Ceil => value.ceil(),
            Self::Round => value.round(),
        };
        // Normalize -0.0 so callers never observe a signed zero
        if rounded == 0.0 {
            0.0
        } else {
            rounded
        }
    }

    /// Divide `numerator` by a positive `denominator` with this rounding
    ///
    /// Exact for the whole `i128` range, which keeps nanosecond differences
    /// free of floating point error.
    pub fn divide(self, numerator: i128, denominator: i128) -> i128 {
        debug_assert!(denominator > 0);
        let quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if remainder == 0 {
            return quotient;
        }
        match self {
            Self::Trunc => quotient,
            Self::Floor => {
                if numerator < 0 {
                    quotient - 1
                } else {
                    quotient
                }
            }
            Self::Ceil => {
                if numerator > 0 {
                    quotient + 1
                } else {
                    quotient
                }
            }
            Self::Round => {
                if remainder.abs() * 2 >= denominator {
                    quotient + numerator.signum()
                } else {
                    quotient
                }
            }
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
