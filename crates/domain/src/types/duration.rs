//! Balanced calendar durations
//!
//! A [`CalendarDuration`] splits the span between two instants into
//! components from a largest unit down to a smallest unit. All components
//! share the same sign.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::instant::ZonedInstant;
use super::unit::TimeUnit;
use crate::errors::{DomainError, Result};

/// Signed duration split into calendar and clock components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CalendarDuration {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub milliseconds: i64,
    pub microseconds: i64,
    pub nanoseconds: i64,
}

impl CalendarDuration {
    /// Balance the span `end - start` between `largest` and `smallest`
    ///
    /// Components finer than `smallest` are truncated. Months are counted on
    /// the calendar of `start`'s zone; everything below the month anchor is
    /// split by fixed unit lengths.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidUnitRange`] when `smallest > largest`.
    pub fn between(
        start: &ZonedInstant,
        end: &ZonedInstant,
        largest: TimeUnit,
        smallest: TimeUnit,
    ) -> Result<Self> {
        if smallest > largest {
            return Err(DomainError::InvalidUnitRange { smallest, largest });
        }

        let negative = end < start;
        let (from, to) = if negative { (end, start) } else { (start, end) };
        let mut duration = Self::default();
        let mut anchor = *from;

        if largest >= TimeUnit::Month {
            let (mut months, _) = from.whole_months_until(to)?;
            if smallest == TimeUnit::Year {
                months -= months % 12;
            }
            if largest == TimeUnit::Year {
                duration.years = months / 12;
                duration.months = months % 12;
            } else {
                duration.months = months;
            }
            anchor = from.add(months, TimeUnit::Month)?;
        }

        let mut remaining = to.epoch_nanos() - anchor.epoch_nanos();
        for unit in TimeUnit::ALL {
            let Some(step) = unit.fixed_nanos() else { continue };
            if unit > largest || unit < smallest {
                continue;
            }
            let count = remaining / step;
            remaining -= count * step;
            let count = i64::try_from(count)
                .map_err(|_| DomainError::OutOfRange(format!("{count} {unit}s")))?;
            duration.set(unit, count);
        }

        Ok(if negative { duration.negated() } else { duration })
    }

    /// Component for `unit`
    pub const fn get(&self, unit: TimeUnit) -> i64 {
        match unit {
            TimeUnit::Year => self.years,
            TimeUnit::Month => self.months,
            TimeUnit::Week => self.weeks,
            TimeUnit::Day => self.days,
            TimeUnit::Hour => self.hours,
            TimeUnit::Minute => self.minutes,
            TimeUnit::Second => self.seconds,
            TimeUnit::Millisecond => self.milliseconds,
            TimeUnit::Microsecond => self.microseconds,
            TimeUnit::Nanosecond => self.nanoseconds,
        }
    }

    fn set(&mut self, unit: TimeUnit, value: i64) {
        let slot = match unit {
            TimeUnit::Year => &mut self.years,
            TimeUnit::Month => &mut self.months,
            TimeUnit::Week => &mut self.weeks,
            TimeUnit::Day => &mut self.days,
            TimeUnit::Hour => &mut self.hours,
            TimeUnit::Minute => &mut self.minutes,
            TimeUnit::Second => &mut self.seconds,
            TimeUnit::Millisecond => &mut self.milliseconds,
            TimeUnit::Microsecond => &mut self.microseconds,
            TimeUnit::Nanosecond => &mut self.nanoseconds,
        };
        *slot = value;
    }

    /// -1, 0 or 1
    pub fn sign(&self) -> i8 {
        TimeUnit::ALL
            .iter()
            .map(|unit| self.get(*unit).signum())
            .find(|sign| *sign != 0)
            .map_or(0, |sign| if sign > 0 { 1 } else { -1 })
    }

    /// Whether every component is zero
    pub fn is_zero(&self) -> bool {
        self.sign() == 0
    }

    /// Same duration with every component negated
    #[must_use]
    pub fn negated(&self) -> Self {
        let mut out = *self;
        for unit in TimeUnit::ALL {
            out.set(unit, -self.get(unit));
        }
        out
    }

    /// Total length in `unit` for durations without month or year components
    ///
    /// Returns `None` when the duration carries months/years (their length
    /// depends on a reference date) or when `unit` is variable length.
    pub fn total(&self, unit: TimeUnit) -> Option<f64> {
        if self.years != 0 || self.months != 0 {
            return None;
        }
        let step = unit.fixed_nanos()?;
        let nanos: i128 = TimeUnit::ALL
            .iter()
            .filter_map(|u| u.fixed_nanos().map(|len| len * i128::from(self.get(*u))))
            .sum();
        Some(nanos as f64 / step as f64)
    }
}

impl fmt::Display for CalendarDuration {
    /// ISO-8601 style rendering, e.g. `P1Y2M3DT4H5M6.000000007S`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        let abs = if self.sign() < 0 {
            f.write_str("-")?;
            self.negated()
        } else {
            *self
        };
        f.write_str("P")?;
        for (value, suffix) in [(abs.years, 'Y'), (abs.months, 'M'), (abs.weeks, 'W'), (abs.days, 'D')]
        {
            if value != 0 {
                write!(f, "{value}{suffix}")?;
            }
        }

        let subsec = i128::from(abs.milliseconds) * 1_000_000
            + i128::from(abs.microseconds) * 1_000
            + i128::from(abs.nanoseconds);
        let seconds = i128::from(abs.seconds) + subsec / 1_000_000_000;
        let fraction = subsec % 1_000_000_000;
        if abs.hours == 0 && abs.minutes == 0 && seconds == 0 && fraction == 0 {
            return Ok(());
        }
        f.write_str("T")?;
        if abs.hours != 0 {
            write!(f, "{}H", abs.hours)?;
        }
        if abs.minutes != 0 {
            write!(f, "{}M", abs.minutes)?;
        }
        if fraction != 0 {
            let digits = format!("{fraction:09}");
            write!(f, "{seconds}.{}S", digits.trim_end_matches('0'))?;
        } else if seconds != 0 {
            write!(f, "{seconds}S")?;
        }
        Ok(())
    }
}
