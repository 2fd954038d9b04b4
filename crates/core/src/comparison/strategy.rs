//! Comparison strategies
//!
//! Each strategy declares which contexts it accepts and a priority. The
//! engine keeps them in a table sorted by descending priority and runs the
//! first one whose [`can_handle`](ComparisonStrategy::can_handle) is true.
//!
//! | Strategy | Priority | Handles |
//! |----------|----------|---------|
//! | `fast_path` | 100 | ordering predicates without a unit |
//! | `unit_comparison` | 80 | ordering predicates with a unit |
//! | `diff` | 70 | `diff` |
//! | `duration` | 60 | `duration` |
//! | `raw_order` | 10 | any ordering predicate |

use std::fmt;
use std::time::Duration;

use atemporal_domain::{CalendarDuration, RoundingMode, TimeUnit};

use super::types::{
    ComparisonContext, ComparisonResult, ComparisonType, ComparisonValue, Precision,
};
use crate::errors::{ComparisonError, Result};

/// Unit used by `diff` when the caller names none
pub const DEFAULT_DIFF_UNIT: TimeUnit = TimeUnit::Millisecond;
/// Largest duration component when the caller names none
pub const DEFAULT_LARGEST_UNIT: TimeUnit = TimeUnit::Day;
/// Smallest duration component when the caller names none
pub const DEFAULT_SMALLEST_UNIT: TimeUnit = TimeUnit::Nanosecond;

/// A way of computing a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonStrategy {
    /// Raw nanosecond ordering for predicates without a unit
    FastPath,
    /// Ordering after truncating both instants to the unit boundary
    UnitComparison,
    /// Signed difference collapsed to a single unit
    Diff,
    /// Balanced calendar duration
    Duration,
    /// Raw ordering for any predicate, ignoring the unit
    RawOrder,
}

impl ComparisonStrategy {
    /// Built-in strategies in dispatch order
    pub const DEFAULT: [Self; 5] =
        [Self::FastPath, Self::UnitComparison, Self::Diff, Self::Duration, Self::RawOrder];

    /// Stable name reported in results
    pub const fn name(self) -> &'static str {
        match self {
            Self::FastPath => "fast_path",
            Self::UnitComparison => "unit_comparison",
            Self::Diff => "diff",
            Self::Duration => "duration",
            Self::RawOrder => "raw_order",
        }
    }

    /// Dispatch priority, higher runs first
    pub const fn priority(self) -> u32 {
        match self {
            Self::FastPath => 100,
            Self::UnitComparison => 80,
            Self::Diff => 70,
            Self::Duration => 60,
            Self::RawOrder => 10,
        }
    }

    /// Whether this strategy accepts `ctx`
    pub fn can_handle(self, ctx: &ComparisonContext) -> bool {
        let ordering = ctx.comparison.is_ordering();
        match self {
            Self::FastPath => ordering && ctx.options.unit.is_none(),
            Self::UnitComparison => ordering && ctx.options.unit.is_some(),
            Self::Diff => ctx.comparison == ComparisonType::Diff,
            Self::Duration => ctx.comparison == ComparisonType::Duration,
            Self::RawOrder => ordering,
        }
    }

    /// Compute the result for `ctx`
    ///
    /// `compute_time` is left at zero; the engine measures the call.
    ///
    /// # Errors
    /// Returns [`ComparisonError::UnsupportedComparison`] when
    /// [`can_handle`](Self::can_handle) is false and
    /// [`ComparisonError::Domain`] when calendar arithmetic fails.
    pub fn execute(self, ctx: &ComparisonContext) -> Result<ComparisonResult> {
        if !self.can_handle(ctx) {
            return Err(ComparisonError::UnsupportedComparison {
                comparison: ctx.comparison,
                unit: ctx.options.unit,
            });
        }

        match self {
            Self::FastPath | Self::RawOrder => {
                let value = ordering_value(ctx, ctx.a.cmp(&ctx.b))?;
                Ok(self.result(ctx, value, ctx.options.unit, Precision::Exact))
            }
            Self::UnitComparison => {
                let unit = ctx.options.unit.unwrap_or(TimeUnit::Nanosecond);
                let a = ctx.a.truncate(unit)?;
                let b = ctx.b.truncate(unit)?;
                let value = ordering_value(ctx, a.cmp(&b))?;
                Ok(self.result(ctx, value, Some(unit), Precision::Truncated))
            }
            Self::Diff => {
                let unit = ctx.options.unit.unwrap_or(DEFAULT_DIFF_UNIT);
                let rounding = ctx.options.rounding;
                let value = ctx.a.diff(&ctx.b, unit, Some(rounding))?;
                let precision = if unit == TimeUnit::Nanosecond {
                    Precision::Exact
                } else if rounding == RoundingMode::Round {
                    Precision::Rounded
                } else {
                    Precision::Truncated
                };
                Ok(self.result(ctx, ComparisonValue::Number(value), Some(unit), precision))
            }
            Self::Duration => {
                let largest = ctx.options.largest_unit.unwrap_or(DEFAULT_LARGEST_UNIT);
                let smallest = ctx.options.smallest_unit.unwrap_or(DEFAULT_SMALLEST_UNIT);
                let duration = CalendarDuration::between(&ctx.b, &ctx.a, largest, smallest)?;
                let precision = if smallest == TimeUnit::Nanosecond {
                    Precision::Exact
                } else {
                    Precision::Truncated
                };
                Ok(self.result(
                    ctx,
                    ComparisonValue::Duration(duration),
                    ctx.options.unit,
                    precision,
                ))
            }
        }
    }

    fn result(
        self,
        ctx: &ComparisonContext,
        value: ComparisonValue,
        unit: Option<TimeUnit>,
        precision: Precision,
    ) -> ComparisonResult {
        ComparisonResult {
            value,
            comparison: ctx.comparison,
            unit,
            precision,
            cached: false,
            compute_time: Duration::ZERO,
            strategy: self.name(),
        }
    }
}

impl fmt::Display for ComparisonStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.priority())
    }
}

fn ordering_value(
    ctx: &ComparisonContext,
    ordering: std::cmp::Ordering,
) -> Result<ComparisonValue> {
    ctx.comparison.evaluate(ordering).map(ComparisonValue::Boolean).ok_or(
        ComparisonError::UnsupportedComparison {
            comparison: ctx.comparison,
            unit: ctx.options.unit,
        },
    )
}
