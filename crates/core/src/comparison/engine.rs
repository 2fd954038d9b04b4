//! Strategy-dispatching comparison engine

use std::sync::Arc;
use std::time::Instant;

use atemporal_common::cache::CacheMetrics;
use atemporal_common::CacheResult;
use atemporal_domain::{CalendarDuration, RoundingMode, TimeUnit, ZonedInstant};
use parking_lot::{Mutex, RwLock};
use tracing::{trace, warn};

use super::cache::ComparisonCache;
use super::strategy::ComparisonStrategy;
use super::types::{
    ComparisonContext, ComparisonMetrics, ComparisonOptions, ComparisonResult, ComparisonType,
    Inclusivity,
};
use crate::cache::DomainCache;
use crate::errors::{ComparisonError, Result};

/// Compares zoned instants through a priority-ordered strategy table
///
/// Results are cached in a [`ComparisonCache`] unless the caller opts out
/// per request, and every call is folded into [`ComparisonMetrics`].
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use atemporal_core::cache::CacheSettings;
/// use atemporal_core::comparison::{ComparisonCache, ComparisonEngine};
/// use atemporal_domain::{TimeUnit, ZonedInstant};
///
/// let cache = Arc::new(ComparisonCache::new(CacheSettings::new(100)).unwrap());
/// let engine = ComparisonEngine::new(cache);
///
/// let a = ZonedInstant::utc(0);
/// let b = ZonedInstant::utc(3_600_000_000_000);
/// assert!(engine.is_before(&a, &b, None).unwrap());
/// assert!(engine.is_same(&a, &b, Some(TimeUnit::Day)).unwrap());
/// assert_eq!(engine.get_metrics().fast_path_hits, 1);
/// ```
pub struct ComparisonEngine {
    strategies: RwLock<Vec<ComparisonStrategy>>,
    cache: Arc<ComparisonCache>,
    metrics: Mutex<ComparisonMetrics>,
}

impl ComparisonEngine {
    /// Engine with the built-in strategies
    pub fn new(cache: Arc<ComparisonCache>) -> Self {
        Self::with_strategies(cache, ComparisonStrategy::DEFAULT)
    }

    /// Engine with a custom strategy table
    pub fn with_strategies(
        cache: Arc<ComparisonCache>,
        strategies: impl IntoIterator<Item = ComparisonStrategy>,
    ) -> Self {
        let engine = Self {
            strategies: RwLock::new(Vec::new()),
            cache,
            metrics: Mutex::new(ComparisonMetrics::default()),
        };
        for strategy in strategies {
            engine.register_strategy(strategy);
        }
        engine
    }

    /// Run a comparison
    ///
    /// # Errors
    /// Returns [`ComparisonError::UnsupportedComparison`] when no registered
    /// strategy handles `ctx`, and propagates strategy errors. Errors are
    /// never cached.
    pub fn compare(&self, ctx: &ComparisonContext) -> Result<ComparisonResult> {
        let started = Instant::now();
        self.metrics.lock().record_call(ctx.comparison, ctx.options.unit);

        let key = ctx.options.use_cache.then(|| ctx.key());
        if let Some(key) = &key {
            if let Some(mut result) = self.cache.lookup(key) {
                result.cached = true;
                let mut metrics = self.metrics.lock();
                metrics.cache_hits += 1;
                metrics.record_time(started.elapsed());
                return Ok(result);
            }
            self.metrics.lock().cache_misses += 1;
        }

        let Some(strategy) = self.select(ctx) else {
            warn!(comparison = %ctx.comparison, unit = ?ctx.options.unit, "no strategy handles comparison");
            self.metrics.lock().record_time(started.elapsed());
            return Err(ComparisonError::UnsupportedComparison {
                comparison: ctx.comparison,
                unit: ctx.options.unit,
            });
        };

        trace!(strategy = strategy.name(), comparison = %ctx.comparison, "dispatching comparison");
        let outcome = strategy.execute(ctx);
        let elapsed = started.elapsed();
        {
            let mut metrics = self.metrics.lock();
            metrics.record_time(elapsed);
            if outcome.is_ok() && strategy == ComparisonStrategy::FastPath {
                metrics.fast_path_hits += 1;
            }
        }

        let mut result = outcome?;
        result.compute_time = elapsed;
        if let Some(key) = key {
            self.cache.store(key, result.clone());
        }
        Ok(result)
    }

    fn select(&self, ctx: &ComparisonContext) -> Option<ComparisonStrategy> {
        self.strategies.read().iter().copied().find(|strategy| strategy.can_handle(ctx))
    }

    fn predicate(
        &self,
        a: &ZonedInstant,
        b: &ZonedInstant,
        comparison: ComparisonType,
        unit: Option<TimeUnit>,
    ) -> Result<bool> {
        let ctx = ComparisonContext::new(*a, *b, comparison)
            .with_options(ComparisonOptions::with_unit(unit));
        self.compare(&ctx)?
            .value
            .as_bool()
            .ok_or(ComparisonError::UnsupportedComparison { comparison, unit })
    }

    /// Whether `a` is before `b`, optionally at `unit` granularity
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn is_before(&self, a: &ZonedInstant, b: &ZonedInstant, unit: Option<TimeUnit>) -> Result<bool> {
        self.predicate(a, b, ComparisonType::IsBefore, unit)
    }

    /// Whether `a` is after `b`, optionally at `unit` granularity
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn is_after(&self, a: &ZonedInstant, b: &ZonedInstant, unit: Option<TimeUnit>) -> Result<bool> {
        self.predicate(a, b, ComparisonType::IsAfter, unit)
    }

    /// Whether `a` and `b` are the same, optionally at `unit` granularity
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn is_same(&self, a: &ZonedInstant, b: &ZonedInstant, unit: Option<TimeUnit>) -> Result<bool> {
        self.predicate(a, b, ComparisonType::IsSame, unit)
    }

    /// Whether `a` is the same as or before `b`
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn is_same_or_before(
        &self,
        a: &ZonedInstant,
        b: &ZonedInstant,
        unit: Option<TimeUnit>,
    ) -> Result<bool> {
        self.predicate(a, b, ComparisonType::IsSameOrBefore, unit)
    }

    /// Whether `a` is the same as or after `b`
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn is_same_or_after(
        &self,
        a: &ZonedInstant,
        b: &ZonedInstant,
        unit: Option<TimeUnit>,
    ) -> Result<bool> {
        self.predicate(a, b, ComparisonType::IsSameOrAfter, unit)
    }

    /// `a - b` in `unit` (milliseconds by default), rounded with `rounding`
    ///
    /// Negative when `a` precedes `b`.
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn diff(
        &self,
        a: &ZonedInstant,
        b: &ZonedInstant,
        unit: Option<TimeUnit>,
        rounding: RoundingMode,
    ) -> Result<f64> {
        let ctx = ComparisonContext::new(*a, *b, ComparisonType::Diff)
            .with_options(ComparisonOptions::with_unit(unit).rounding(rounding));
        self.compare(&ctx)?.value.as_number().ok_or(ComparisonError::UnsupportedComparison {
            comparison: ComparisonType::Diff,
            unit,
        })
    }

    /// Balanced duration `a - b` between `largest` (day by default) and
    /// `smallest` (nanosecond by default)
    ///
    /// # Errors
    /// See [`compare`](Self::compare); an inverted unit range is a
    /// [`ComparisonError::Domain`] error.
    pub fn duration(
        &self,
        a: &ZonedInstant,
        b: &ZonedInstant,
        largest: Option<TimeUnit>,
        smallest: Option<TimeUnit>,
    ) -> Result<CalendarDuration> {
        let ctx = ComparisonContext::new(*a, *b, ComparisonType::Duration)
            .with_options(ComparisonOptions::default().units(largest, smallest));
        self.compare(&ctx)?.value.as_duration().ok_or(ComparisonError::UnsupportedComparison {
            comparison: ComparisonType::Duration,
            unit: None,
        })
    }

    /// Whether `date` lies between `start` and `end`
    ///
    /// Composed from two ordering predicates; `inclusivity` decides whether
    /// each endpoint counts.
    ///
    /// # Errors
    /// See [`compare`](Self::compare).
    pub fn is_between(
        &self,
        date: &ZonedInstant,
        start: &ZonedInstant,
        end: &ZonedInstant,
        unit: Option<TimeUnit>,
        inclusivity: Inclusivity,
    ) -> Result<bool> {
        let after_start = if inclusivity.includes_start() {
            self.is_same_or_after(date, start, unit)?
        } else {
            self.is_after(date, start, unit)?
        };
        if !after_start {
            return Ok(false);
        }
        if inclusivity.includes_end() {
            self.is_same_or_before(date, end, unit)
        } else {
            self.is_before(date, end, unit)
        }
    }

    /// Add `strategy` to the table, keeping it sorted by priority
    ///
    /// Returns `false` if it was already registered.
    pub fn register_strategy(&self, strategy: ComparisonStrategy) -> bool {
        let mut strategies = self.strategies.write();
        if strategies.contains(&strategy) {
            return false;
        }
        let position = strategies
            .iter()
            .position(|existing| existing.priority() < strategy.priority())
            .unwrap_or(strategies.len());
        strategies.insert(position, strategy);
        true
    }

    /// Remove `strategy` from the table
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister_strategy(&self, strategy: ComparisonStrategy) -> bool {
        let mut strategies = self.strategies.write();
        let before = strategies.len();
        strategies.retain(|existing| *existing != strategy);
        strategies.len() != before
    }

    /// Registered strategies in dispatch order
    pub fn strategies(&self) -> Vec<ComparisonStrategy> {
        self.strategies.read().clone()
    }

    /// Snapshot of the running metrics
    pub fn get_metrics(&self) -> ComparisonMetrics {
        self.metrics.lock().clone()
    }

    /// Zero the running metrics
    pub fn reset_metrics(&self) {
        *self.metrics.lock() = ComparisonMetrics::default();
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Usage snapshot of the result cache
    pub fn get_cache_stats(&self) -> CacheMetrics {
        self.cache.get_stats()
    }

    /// Change the result cache capacity
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// when `max_size` is 0.
    pub fn set_max_cache_size(&self, max_size: usize) -> CacheResult<usize> {
        self.cache.set_max_cache_size(max_size)
    }

    /// Allow or forbid optimizer-driven resizes of the result cache
    pub fn set_dynamic_sizing(&self, enabled: bool) {
        self.cache.set_dynamic_sizing(enabled);
    }

    /// Run the cache optimizer now if its gate is open
    pub fn optimize_cache(&self) -> bool {
        self.cache.optimize()
    }

    /// Result cache
    pub fn cache(&self) -> &Arc<ComparisonCache> {
        &self.cache
    }
}

impl std::fmt::Debug for ComparisonEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonEngine")
            .field("strategies", &*self.strategies.read())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for comparison::engine.
    use super::*;
    use crate::cache::CacheSettings;
    use crate::comparison::Precision;

    const NANOS_PER_DAY: i128 = 86_400_000_000_000;

    fn engine() -> ComparisonEngine {
        ComparisonEngine::new(Arc::new(ComparisonCache::new(CacheSettings::new(100)).unwrap()))
    }

    /// Validates the fast path metric.
    ///
    /// Assertions:
    /// - Confirms `is_before` without a unit increments `fast_path_hits`.
    /// - Confirms the call and the operation breakdown are counted.
    #[test]
    fn test_fast_path_hits() {
        let engine = engine();
        let before = engine.get_metrics().fast_path_hits;

        assert!(engine.is_before(&ZonedInstant::utc(1), &ZonedInstant::utc(2), None).unwrap());

        let metrics = engine.get_metrics();
        assert_eq!(metrics.fast_path_hits, before + 1);
        assert_eq!(metrics.total_comparisons, 1);
        assert_eq!(metrics.operation_breakdown[&ComparisonType::IsBefore], 1);
        assert!(metrics.unit_breakdown.is_empty());
    }

    /// Validates idempotence through the cache.
    ///
    /// Assertions:
    /// - Confirms a repeated context returns the same value with `cached`.
    /// - Confirms the cache hit is counted and the strategy name survives.
    #[test]
    fn test_repeat_is_cached() {
        let engine = engine();
        let ctx = ComparisonContext::new(
            ZonedInstant::utc(NANOS_PER_DAY),
            ZonedInstant::utc(0),
            ComparisonType::Diff,
        )
        .with_options(ComparisonOptions::with_unit(Some(TimeUnit::Hour)));

        let first = engine.compare(&ctx).unwrap();
        let second = engine.compare(&ctx).unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.value, second.value);
        assert_eq!(second.strategy, "diff");

        let metrics = engine.get_metrics();
        assert_eq!((metrics.cache_hits, metrics.cache_misses), (1, 1));
        assert_eq!(metrics.unit_breakdown[&TimeUnit::Hour], 2);
    }

    /// Validates opting out of the cache.
    ///
    /// Assertions:
    /// - Ensures nothing is stored and no hit or miss is recorded.
    #[test]
    fn test_use_cache_false() {
        let engine = engine();
        let ctx = ComparisonContext::new(ZonedInstant::utc(0), ZonedInstant::utc(1), ComparisonType::IsSame)
            .with_options(ComparisonOptions::default().without_cache());

        assert!(!engine.compare(&ctx).unwrap().cached);
        assert!(!engine.compare(&ctx).unwrap().cached);
        assert_eq!(engine.get_cache_stats().size, 0);
        assert_eq!(engine.get_metrics().cache_misses, 0);
    }

    /// Validates the diff sign convention at nanosecond resolution.
    ///
    /// Assertions:
    /// - Confirms instants 1ns apart differ by 0 in milliseconds.
    /// - Confirms 1 and -1 in nanoseconds depending on order.
    #[test]
    fn test_diff_one_nanosecond() {
        let engine = engine();
        let earlier = ZonedInstant::utc(1_000);
        let later = ZonedInstant::utc(1_001);

        assert_eq!(engine.diff(&later, &earlier, None, RoundingMode::Trunc).unwrap(), 0.0);
        assert_eq!(engine.diff(&later, &earlier, Some(TimeUnit::Nanosecond), RoundingMode::Trunc).unwrap(), 1.0);
        assert_eq!(engine.diff(&earlier, &later, Some(TimeUnit::Nanosecond), RoundingMode::Trunc).unwrap(), -1.0);

        let exact = ComparisonContext::new(later, earlier, ComparisonType::Diff)
            .with_options(ComparisonOptions::with_unit(Some(TimeUnit::Nanosecond)));
        assert_eq!(engine.compare(&exact).unwrap().precision, Precision::Exact);
    }

    /// Validates unit-aware predicates.
    ///
    /// Assertions:
    /// - Confirms instants on the same day are the same day but not the same
    ///   instant.
    /// - Confirms ordering holds across days.
    #[test]
    fn test_unit_predicates() {
        let engine = engine();
        let morning = ZonedInstant::utc(NANOS_PER_DAY + 1);
        let evening = ZonedInstant::utc(2 * NANOS_PER_DAY - 1);
        let next_day = ZonedInstant::utc(2 * NANOS_PER_DAY);

        assert!(engine.is_same(&morning, &evening, Some(TimeUnit::Day)).unwrap());
        assert!(!engine.is_same(&morning, &evening, None).unwrap());
        assert!(engine.is_same_or_before(&evening, &morning, Some(TimeUnit::Day)).unwrap());
        assert!(engine.is_after(&next_day, &evening, Some(TimeUnit::Day)).unwrap());
        assert!(engine.is_same_or_after(&next_day, &morning, None).unwrap());
    }

    /// Validates `is_between` inclusivity.
    ///
    /// Assertions:
    /// - Confirms endpoints only count when included.
    /// - Confirms a date outside the range is never between.
    #[test]
    fn test_is_between() {
        let engine = engine();
        let start = ZonedInstant::utc(10);
        let end = ZonedInstant::utc(20);
        let mid = ZonedInstant::utc(15);

        let check = |date: &ZonedInstant, inclusivity: &str| {
            engine.is_between(date, &start, &end, None, inclusivity.parse().unwrap()).unwrap()
        };

        assert!(check(&mid, "()"));
        assert!(!check(&start, "()"));
        assert!(check(&start, "[)"));
        assert!(!check(&end, "[)"));
        assert!(check(&end, "(]"));
        assert!(check(&end, "[]"));
        assert!(!check(&ZonedInstant::utc(25), "[]"));
    }

    /// Validates dispatch when strategies are removed.
    ///
    /// Assertions:
    /// - Confirms raw order takes over predicates once the fast path is gone.
    /// - Ensures an empty table yields `UnsupportedComparison`.
    /// - Ensures a raw `IsBetween` context is unsupported.
    #[test]
    fn test_strategy_table_changes() {
        let engine = engine();
        let (a, b) = (ZonedInstant::utc(1), ZonedInstant::utc(2));

        assert!(engine.unregister_strategy(ComparisonStrategy::FastPath));
        assert!(!engine.unregister_strategy(ComparisonStrategy::FastPath));
        let ctx = ComparisonContext::new(a, b, ComparisonType::IsBefore);
        assert_eq!(engine.compare(&ctx).unwrap().strategy, "raw_order");
        assert_eq!(engine.get_metrics().fast_path_hits, 0);

        let between = ComparisonContext::new(a, b, ComparisonType::IsBetween);
        assert!(matches!(
            engine.compare(&between),
            Err(ComparisonError::UnsupportedComparison { comparison: ComparisonType::IsBetween, .. })
        ));

        for strategy in engine.strategies() {
            engine.unregister_strategy(strategy);
        }
        let ctx = ctx.with_options(ComparisonOptions::default().without_cache());
        assert!(engine.compare(&ctx).is_err());

        assert!(engine.register_strategy(ComparisonStrategy::RawOrder));
        assert!(engine.register_strategy(ComparisonStrategy::FastPath));
        assert_eq!(
            engine.strategies(),
            vec![ComparisonStrategy::FastPath, ComparisonStrategy::RawOrder]
        );
    }

    /// Validates duration requests.
    ///
    /// Assertions:
    /// - Confirms the balanced components.
    /// - Ensures an inverted unit range is a domain error.
    #[test]
    fn test_duration() {
        let engine = engine();
        let a = ZonedInstant::utc(NANOS_PER_DAY + 90_000_000_000);
        let b = ZonedInstant::utc(0);

        let duration = engine.duration(&a, &b, None, Some(TimeUnit::Second)).unwrap();
        assert_eq!((duration.days, duration.minutes, duration.seconds), (1, 1, 30));

        let err = engine.duration(&a, &b, Some(TimeUnit::Second), Some(TimeUnit::Day)).unwrap_err();
        assert!(matches!(err, ComparisonError::Domain(_)));
    }

    /// Validates cache controls.
    ///
    /// Assertions:
    /// - Ensures a zero size is rejected.
    /// - Confirms `clear_cache` empties the cache and `reset_metrics` zeroes
    ///   the metrics.
    #[test]
    fn test_cache_controls() {
        let engine = engine();
        engine.is_before(&ZonedInstant::utc(1), &ZonedInstant::utc(2), None).unwrap();

        assert!(engine.set_max_cache_size(0).is_err());
        assert_eq!(engine.get_cache_stats().size, 1);
        engine.clear_cache();
        assert_eq!(engine.get_cache_stats().size, 0);
        engine.reset_metrics();
        assert_eq!(engine.get_metrics(), ComparisonMetrics::default());
        engine.set_dynamic_sizing(false);
        assert!(!engine.optimize_cache());
    }
}
