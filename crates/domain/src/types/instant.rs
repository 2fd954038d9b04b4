//! Zoned, nanosecond-resolution instants
//!
//! [`ZonedInstant`] is the value every cache key and comparison in the
//! workspace is built from. Ordering, equality and hashing use the epoch
//! nanosecond value only; the attached zone decides how calendar units
//! (days, months, years) are interpreted.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveDateTime, Offset, TimeZone,
    Timelike,
};
use chrono_tz::Tz;

use super::unit::{RoundingMode, TimeUnit, NANOS_PER_SECOND};
use crate::errors::{DomainError, Result};

/// A point in time with nanosecond resolution, bound to an IANA timezone
///
/// # Examples
///
/// ```
/// use atemporal_domain::{TimeUnit, ZonedInstant};
///
/// let a = ZonedInstant::in_zone(1_700_000_000_000_000_000, "Europe/Paris").unwrap();
/// let b = a.add(1, TimeUnit::Day).unwrap();
/// assert!(a < b);
/// assert_eq!(b.diff(&a, TimeUnit::Hour, None).unwrap(), 24.0);
/// ```
#[derive(Clone, Copy)]
pub struct ZonedInstant {
    epoch_nanos: i128,
    zone: Tz,
}

impl ZonedInstant {
    /// Create an instant from nanoseconds since the UNIX epoch
    pub const fn from_epoch_nanos(epoch_nanos: i128, zone: Tz) -> Self {
        Self { epoch_nanos, zone }
    }

    /// Create an instant from milliseconds since the UNIX epoch
    pub fn from_epoch_millis(epoch_millis: i64, zone: Tz) -> Self {
        Self::from_epoch_nanos(i128::from(epoch_millis) * 1_000_000, zone)
    }

    /// Create a UTC instant
    pub const fn utc(epoch_nanos: i128) -> Self {
        Self::from_epoch_nanos(epoch_nanos, Tz::UTC)
    }

    /// Create an instant in a zone given by its IANA name
    pub fn in_zone(epoch_nanos: i128, zone: &str) -> Result<Self> {
        let zone = zone.parse::<Tz>().map_err(|_| DomainError::InvalidTimezone(zone.to_string()))?;
        Ok(Self::from_epoch_nanos(epoch_nanos, zone))
    }

    /// Create an instant from a chrono date-time
    pub fn from_datetime(datetime: &DateTime<Tz>) -> Self {
        let nanos = i128::from(datetime.timestamp()) * NANOS_PER_SECOND
            + i128::from(datetime.timestamp_subsec_nanos());
        Self::from_epoch_nanos(nanos, datetime.timezone())
    }

    /// Same instant viewed from another zone
    #[must_use]
    pub const fn with_zone(self, zone: Tz) -> Self {
        Self { epoch_nanos: self.epoch_nanos, zone }
    }

    /// Nanoseconds since the UNIX epoch
    pub const fn epoch_nanos(&self) -> i128 {
        self.epoch_nanos
    }

    /// Milliseconds since the UNIX epoch (floored)
    pub const fn epoch_millis(&self) -> i128 {
        self.epoch_nanos.div_euclid(1_000_000)
    }

    /// Timezone attached to this instant
    pub const fn zone(&self) -> Tz {
        self.zone
    }

    /// Convert to a chrono date-time in the attached zone
    pub fn to_datetime(&self) -> Result<DateTime<Tz>> {
        let secs = i64::try_from(self.epoch_nanos.div_euclid(NANOS_PER_SECOND))
            .map_err(|_| self.out_of_range())?;
        let subsec = u32::try_from(self.epoch_nanos.rem_euclid(NANOS_PER_SECOND))
            .map_err(|_| self.out_of_range())?;
        DateTime::from_timestamp(secs, subsec)
            .map(|utc| utc.with_timezone(&self.zone))
            .ok_or_else(|| self.out_of_range())
    }

    /// Start of the `unit` containing this instant, in the attached zone
    ///
    /// Weeks start on Monday. Sub-second units and seconds truncate the epoch
    /// value directly; larger units truncate local wall-clock fields.
    pub fn truncate(&self, unit: TimeUnit) -> Result<Self> {
        if unit <= TimeUnit::Second {
            let step = unit.fixed_nanos().unwrap_or(1);
            return Ok(Self::from_epoch_nanos(
                self.epoch_nanos.div_euclid(step) * step,
                self.zone,
            ));
        }

        let datetime = self.to_datetime()?;
        let local = datetime.naive_local();
        let date = local.date();
        let start = match unit {
            TimeUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
            TimeUnit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            TimeUnit::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday()))),
            _ => Some(date),
        }
        .and_then(|day| match unit {
            TimeUnit::Hour => day.and_hms_opt(local.hour(), 0, 0),
            TimeUnit::Minute => day.and_hms_opt(local.hour(), local.minute(), 0),
            _ => day.and_hms_opt(0, 0, 0),
        })
        .ok_or_else(|| self.out_of_range())?;

        self.resolve_local(start, datetime.offset().fix().local_minus_utc())
    }

    /// Add `amount` of `unit`
    ///
    /// Days, weeks, months and years follow the local calendar (month
    /// addition clamps to the last day of the target month); smaller units
    /// add elapsed time.
    pub fn add(&self, amount: i64, unit: TimeUnit) -> Result<Self> {
        if !unit.is_calendar() {
            let step = unit.fixed_nanos().unwrap_or(1);
            let nanos = i128::from(amount)
                .checked_mul(step)
                .and_then(|delta| self.epoch_nanos.checked_add(delta))
                .ok_or_else(|| self.out_of_range())?;
            return Ok(Self::from_epoch_nanos(nanos, self.zone));
        }

        let datetime = self.to_datetime()?;
        let local = datetime.naive_local();
        let shifted = match unit {
            TimeUnit::Year => amount.checked_mul(12).and_then(|months| shift_months(local, months)),
            TimeUnit::Month => shift_months(local, amount),
            TimeUnit::Week => amount.checked_mul(7).and_then(|days| shift_days(local, days)),
            _ => shift_days(local, amount),
        }
        .ok_or_else(|| self.out_of_range())?;

        self.resolve_local(shifted, datetime.offset().fix().local_minus_utc())
    }

    /// Signed difference `self - other` expressed in `unit`
    ///
    /// With `rounding == None` the fractional value is returned. Fixed-length
    /// units are computed on exact integer nanoseconds; months and years use
    /// calendar month spans in `other`'s zone.
    pub fn diff(&self, other: &Self, unit: TimeUnit, rounding: Option<RoundingMode>) -> Result<f64> {
        if let Some(step) = unit.fixed_nanos() {
            let delta = self
                .epoch_nanos
                .checked_sub(other.epoch_nanos)
                .ok_or_else(|| self.out_of_range())?;
            return Ok(match rounding {
                Some(mode) => mode.divide(delta, step) as f64,
                None => delta as f64 / step as f64,
            });
        }

        let months = Self::months_between(other, self)?;
        let value = if unit == TimeUnit::Year { months / 12.0 } else { months };
        Ok(rounding.map_or(value, |mode| mode.apply(value)))
    }

    /// Whole calendar months from `self` to a later-or-equal `to`, together
    /// with the anchor reached after adding them
    pub(crate) fn whole_months_until(&self, to: &Self) -> Result<(i64, Self)> {
        let start = self.to_datetime()?.naive_local();
        let end = to.with_zone(self.zone).to_datetime()?.naive_local();
        let mut whole = i64::from(end.year() - start.year()) * 12 + i64::from(end.month())
            - i64::from(start.month());

        let mut anchor = self.add(whole, TimeUnit::Month)?;
        while anchor > *to {
            whole -= 1;
            anchor = self.add(whole, TimeUnit::Month)?;
        }
        let mut next = self.add(whole + 1, TimeUnit::Month)?;
        while next <= *to {
            whole += 1;
            anchor = next;
            next = self.add(whole + 1, TimeUnit::Month)?;
        }
        Ok((whole, anchor))
    }

    fn months_between(from: &Self, to: &Self) -> Result<f64> {
        if to < from {
            return Ok(-Self::months_between(to, from)?);
        }
        let (whole, anchor) = from.whole_months_until(to)?;
        let next = from.add(whole + 1, TimeUnit::Month)?;
        let span = next.epoch_nanos - anchor.epoch_nanos;
        let progressed = to.epoch_nanos - anchor.epoch_nanos;
        Ok(whole as f64 + progressed as f64 / span as f64)
    }

    /// Map a local wall-clock time back to an instant
    ///
    /// Ambiguous times prefer the occurrence with `preferred_offset`; times
    /// inside a gap are interpreted with `preferred_offset`.
    fn resolve_local(&self, local: NaiveDateTime, preferred_offset: i32) -> Result<Self> {
        match self.zone.from_local_datetime(&local) {
            LocalResult::Single(datetime) => Ok(Self::from_datetime(&datetime)),
            LocalResult::Ambiguous(earliest, latest) => {
                if latest.offset().fix().local_minus_utc() == preferred_offset {
                    Ok(Self::from_datetime(&latest))
                } else {
                    Ok(Self::from_datetime(&earliest))
                }
            }
            LocalResult::None => {
                let as_utc = local.and_utc();
                let nanos = i128::from(as_utc.timestamp()) * NANOS_PER_SECOND
                    + i128::from(as_utc.timestamp_subsec_nanos())
                    - i128::from(preferred_offset) * NANOS_PER_SECOND;
                Ok(Self::from_epoch_nanos(nanos, self.zone))
            }
        }
    }

    fn out_of_range(&self) -> DomainError {
        DomainError::OutOfRange(format!("{} ns in {}", self.epoch_nanos, self.zone.name()))
    }
}

fn shift_months(local: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        local.checked_add_months(magnitude)
    } else {
        local.checked_sub_months(magnitude)
    }
}

fn shift_days(local: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        local.checked_add_days(magnitude)
    } else {
        local.checked_sub_days(magnitude)
    }
}

impl PartialEq for ZonedInstant {
    fn eq(&self, other: &Self) -> bool {
        self.epoch_nanos == other.epoch_nanos
    }
}

impl Eq for ZonedInstant {}

impl PartialOrd for ZonedInstant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ZonedInstant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch_nanos.cmp(&other.epoch_nanos)
    }
}

impl Hash for ZonedInstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch_nanos.hash(state);
    }
}

impl fmt::Debug for ZonedInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZonedInstant")
            .field("epoch_nanos", &self.epoch_nanos)
            .field("zone", &self.zone.name())
            .finish()
    }
}

impl fmt::Display for ZonedInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Ok(datetime) => write!(f, "{}[{}]", datetime.to_rfc3339(), self.zone.name()),
            Err(_) => write!(f, "{}ns[{}]", self.epoch_nanos, self.zone.name()),
        }
    }
}
