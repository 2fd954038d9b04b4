//! Comparison requests, results and metrics

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use atemporal_domain::{CalendarDuration, RoundingMode, TimeUnit, ZonedInstant};
use serde::{Deserialize, Serialize};

use crate::errors::ComparisonError;

/// Operation requested from the comparison engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    IsBefore,
    IsAfter,
    IsSame,
    IsSameOrBefore,
    IsSameOrAfter,
    Diff,
    Duration,
    IsBetween,
}

impl ComparisonType {
    /// Canonical snake case name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IsBefore => "is_before",
            Self::IsAfter => "is_after",
            Self::IsSame => "is_same",
            Self::IsSameOrBefore => "is_same_or_before",
            Self::IsSameOrAfter => "is_same_or_after",
            Self::Diff => "diff",
            Self::Duration => "duration",
            Self::IsBetween => "is_between",
        }
    }

    /// Whether this is one of the five ordering predicates
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::IsBefore
                | Self::IsAfter
                | Self::IsSame
                | Self::IsSameOrBefore
                | Self::IsSameOrAfter
        )
    }

    /// Evaluate an ordering predicate for `a.cmp(b)`
    ///
    /// Returns `None` for non-predicate types.
    pub fn evaluate(self, ordering: Ordering) -> Option<bool> {
        match self {
            Self::IsBefore => Some(ordering == Ordering::Less),
            Self::IsAfter => Some(ordering == Ordering::Greater),
            Self::IsSame => Some(ordering == Ordering::Equal),
            Self::IsSameOrBefore => Some(ordering != Ordering::Greater),
            Self::IsSameOrAfter => Some(ordering != Ordering::Less),
            Self::Diff | Self::Duration | Self::IsBetween => None,
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How exactly a result reflects the raw instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Computed from the raw nanosecond values
    Exact,
    /// Computed after truncating to a unit
    Truncated,
    /// Computed with rounding to the nearest unit
    Rounded,
}

/// Knobs for a single comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonOptions {
    /// Unit to truncate to (predicates) or collapse to (diff)
    pub unit: Option<TimeUnit>,
    /// Requested precision, echoed in the cache key
    pub precision: Option<Precision>,
    /// Consult and populate the comparison cache
    pub use_cache: bool,
    /// Rounding for diffs
    pub rounding: RoundingMode,
    /// Largest component of a duration
    pub largest_unit: Option<TimeUnit>,
    /// Smallest component of a duration
    pub smallest_unit: Option<TimeUnit>,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            unit: None,
            precision: None,
            use_cache: true,
            rounding: RoundingMode::Trunc,
            largest_unit: None,
            smallest_unit: None,
        }
    }
}

impl ComparisonOptions {
    /// Options with `unit` set
    pub fn with_unit(unit: Option<TimeUnit>) -> Self {
        Self { unit, ..Self::default() }
    }

    /// Disable the comparison cache
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Set the diff rounding mode
    #[must_use]
    pub fn rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// Set the duration component range
    #[must_use]
    pub fn units(mut self, largest: Option<TimeUnit>, smallest: Option<TimeUnit>) -> Self {
        self.largest_unit = largest;
        self.smallest_unit = smallest;
        self
    }
}

/// Structured cache key for a comparison
///
/// Built from the raw nanosecond values and zones of both instants plus every
/// option that can change the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparisonKey {
    pub a_nanos: i128,
    pub a_zone: &'static str,
    pub b_nanos: i128,
    pub b_zone: &'static str,
    pub comparison: ComparisonType,
    pub unit: Option<TimeUnit>,
    pub precision: Option<Precision>,
    pub rounding: RoundingMode,
    pub largest_unit: Option<TimeUnit>,
    pub smallest_unit: Option<TimeUnit>,
}

/// A fully described comparison request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonContext {
    /// First instant
    pub a: ZonedInstant,
    /// Second instant
    pub b: ZonedInstant,
    /// Requested operation
    pub comparison: ComparisonType,
    /// Options
    pub options: ComparisonOptions,
    /// Precomputed cache key, derived on demand when absent
    pub cache_key: Option<ComparisonKey>,
}

impl ComparisonContext {
    /// Context with default options
    pub fn new(a: ZonedInstant, b: ZonedInstant, comparison: ComparisonType) -> Self {
        Self { a, b, comparison, options: ComparisonOptions::default(), cache_key: None }
    }

    /// Replace the options
    #[must_use]
    pub fn with_options(mut self, options: ComparisonOptions) -> Self {
        self.options = options;
        self
    }

    /// Cache key for this context
    pub fn key(&self) -> ComparisonKey {
        self.cache_key.unwrap_or_else(|| ComparisonKey {
            a_nanos: self.a.epoch_nanos(),
            a_zone: self.a.zone().name(),
            b_nanos: self.b.epoch_nanos(),
            b_zone: self.b.zone().name(),
            comparison: self.comparison,
            unit: self.options.unit,
            precision: self.options.precision,
            rounding: self.options.rounding,
            largest_unit: self.options.largest_unit,
            smallest_unit: self.options.smallest_unit,
        })
    }
}

/// Value produced by a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ComparisonValue {
    Boolean(bool),
    Number(f64),
    Duration(CalendarDuration),
}

impl ComparisonValue {
    /// Boolean payload
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric payload
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Duration payload
    pub const fn as_duration(&self) -> Option<CalendarDuration> {
        match self {
            Self::Duration(value) => Some(*value),
            _ => None,
        }
    }
}

/// Outcome of a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Computed value
    pub value: ComparisonValue,
    /// Echo of the requested operation
    pub comparison: ComparisonType,
    /// Unit the value was computed in, if any
    pub unit: Option<TimeUnit>,
    /// How the value relates to the raw instants
    pub precision: Precision,
    /// Served from the comparison cache
    pub cached: bool,
    /// Time spent in the strategy when the value was computed
    pub compute_time: Duration,
    /// Name of the strategy that produced the value
    pub strategy: &'static str,
}

/// Cached comparison result with access bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonCacheEntry {
    /// Cached result
    pub result: ComparisonResult,
    /// When the entry was stored
    pub timestamp: SystemTime,
    /// Number of cache hits served from this entry
    pub access_count: u64,
    /// When the entry was last served
    pub last_access: SystemTime,
}

impl ComparisonCacheEntry {
    /// Fresh entry stored at `now`
    pub fn new(result: ComparisonResult, now: SystemTime) -> Self {
        Self { result, timestamp: now, access_count: 0, last_access: now }
    }

    /// Record a hit at `now`
    pub fn touch(&mut self, now: SystemTime) {
        self.access_count += 1;
        self.last_access = now;
    }
}

/// Running engine statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonMetrics {
    /// Every `compare` call
    pub total_comparisons: u64,
    /// Results served from the comparison cache
    pub cache_hits: u64,
    /// Cache lookups that required computation
    pub cache_misses: u64,
    /// Sum of per-call time
    pub total_compute_time: Duration,
    /// `total_compute_time / total_comparisons`
    pub average_compute_time: Duration,
    /// Results produced by the fast path strategy
    pub fast_path_hits: u64,
    /// Calls per operation
    pub operation_breakdown: BTreeMap<ComparisonType, u64>,
    /// Calls per unit, for calls that named a unit
    pub unit_breakdown: BTreeMap<TimeUnit, u64>,
}

impl ComparisonMetrics {
    /// Fold one call into the totals
    pub(crate) fn record_call(&mut self, comparison: ComparisonType, unit: Option<TimeUnit>) {
        self.total_comparisons += 1;
        *self.operation_breakdown.entry(comparison).or_insert(0) += 1;
        if let Some(unit) = unit {
            *self.unit_breakdown.entry(unit).or_insert(0) += 1;
        }
    }

    /// Fold one call's elapsed time into the running average
    pub(crate) fn record_time(&mut self, elapsed: Duration) {
        self.total_compute_time += elapsed;
        let count = u32::try_from(self.total_comparisons.max(1)).unwrap_or(u32::MAX);
        self.average_compute_time = self.total_compute_time / count;
    }

    /// Share of calls served by the fast path
    pub fn fast_path_ratio(&self) -> f64 {
        ratio(self.fast_path_hits, self.total_comparisons)
    }

    /// Share of cache lookups that hit
    pub fn cache_hit_ratio(&self) -> f64 {
        ratio(self.cache_hits, self.cache_hits + self.cache_misses)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Endpoint handling for [`ComparisonEngine::is_between`](super::ComparisonEngine::is_between)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inclusivity {
    /// `()`: both endpoints excluded
    #[default]
    Exclusive,
    /// `[]`: both endpoints included
    Inclusive,
    /// `[)`: start included
    StartInclusive,
    /// `(]`: end included
    EndInclusive,
}

impl Inclusivity {
    /// Whether the start endpoint is included
    pub const fn includes_start(self) -> bool {
        matches!(self, Self::Inclusive | Self::StartInclusive)
    }

    /// Whether the end endpoint is included
    pub const fn includes_end(self) -> bool {
        matches!(self, Self::Inclusive | Self::EndInclusive)
    }

    /// Bracket notation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exclusive => "()",
            Self::Inclusive => "[]",
            Self::StartInclusive => "[)",
            Self::EndInclusive => "(]",
        }
    }
}

impl FromStr for Inclusivity {
    type Err = ComparisonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "()" => Ok(Self::Exclusive),
            "[]" => Ok(Self::Inclusive),
            "[)" => Ok(Self::StartInclusive),
            "(]" => Ok(Self::EndInclusive),
            other => Err(ComparisonError::InvalidInclusivity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for comparison::types.
    use super::*;

    /// Validates `ComparisonType::evaluate` for every predicate.
    ///
    /// Assertions:
    /// - Confirms each predicate against `Less`, `Equal` and `Greater`.
    /// - Ensures non-predicates evaluate to `None`.
    #[test]
    fn test_evaluate_predicates() {
        use Ordering::{Equal, Greater, Less};

        assert_eq!(ComparisonType::IsBefore.evaluate(Less), Some(true));
        assert_eq!(ComparisonType::IsBefore.evaluate(Equal), Some(false));
        assert_eq!(ComparisonType::IsAfter.evaluate(Greater), Some(true));
        assert_eq!(ComparisonType::IsSame.evaluate(Equal), Some(true));
        assert_eq!(ComparisonType::IsSameOrBefore.evaluate(Equal), Some(true));
        assert_eq!(ComparisonType::IsSameOrBefore.evaluate(Greater), Some(false));
        assert_eq!(ComparisonType::IsSameOrAfter.evaluate(Less), Some(false));
        assert_eq!(ComparisonType::Diff.evaluate(Less), None);
        assert!(!ComparisonType::IsBetween.is_ordering());
    }

    /// Validates cache key derivation.
    ///
    /// Assertions:
    /// - Confirms keys differ when only the unit differs.
    /// - Confirms a precomputed key is returned as is.
    #[test]
    fn test_context_key() {
        let a = ZonedInstant::utc(1);
        let b = ZonedInstant::utc(2);
        let plain = ComparisonContext::new(a, b, ComparisonType::IsSame);
        let by_day = plain.clone().with_options(ComparisonOptions::with_unit(Some(TimeUnit::Day)));

        assert_ne!(plain.key(), by_day.key());
        assert_eq!(plain.key().a_zone, "UTC");

        let mut preset = plain.clone();
        preset.cache_key = Some(by_day.key());
        assert_eq!(preset.key(), by_day.key());
    }

    /// Validates inclusivity parsing.
    ///
    /// Assertions:
    /// - Confirms all four bracket forms round-trip through `as_str`.
    /// - Ensures anything else is `InvalidInclusivity`.
    #[test]
    fn test_inclusivity_parse() {
        for text in ["()", "[]", "[)", "(]"] {
            assert_eq!(text.parse::<Inclusivity>().unwrap().as_str(), text);
        }
        assert!("[)".parse::<Inclusivity>().unwrap().includes_start());
        assert!(!"[)".parse::<Inclusivity>().unwrap().includes_end());
        assert_eq!(
            "<>".parse::<Inclusivity>(),
            Err(ComparisonError::InvalidInclusivity("<>".to_string()))
        );
    }

    /// Validates running metrics.
    ///
    /// Assertions:
    /// - Confirms the cumulative average compute time.
    /// - Confirms breakdowns and ratios.
    #[test]
    fn test_metrics_running_average() {
        let mut metrics = ComparisonMetrics::default();
        metrics.record_call(ComparisonType::IsBefore, None);
        metrics.record_time(Duration::from_micros(30));
        metrics.record_call(ComparisonType::Diff, Some(TimeUnit::Day));
        metrics.record_time(Duration::from_micros(10));
        metrics.fast_path_hits = 1;
        metrics.cache_misses = 2;

        assert_eq!(metrics.average_compute_time, Duration::from_micros(20));
        assert_eq!(metrics.operation_breakdown[&ComparisonType::Diff], 1);
        assert_eq!(metrics.unit_breakdown.get(&TimeUnit::Day), Some(&1));
        assert!((metrics.fast_path_ratio() - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.cache_hit_ratio(), 0.0);
    }
}
