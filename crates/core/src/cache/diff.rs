//! Cache of unit differences between two instants

use std::sync::atomic::{AtomicU64, Ordering};

use atemporal_common::cache::{CacheMetrics, DetailedCacheMetrics};
use atemporal_common::CacheResult;
use atemporal_domain::{DomainError, RoundingMode, TimeUnit, ZonedInstant};
use tracing::debug;

use super::managed::{CacheEfficiency, CacheSettings, DomainCache, ManagedCache};

/// Key of a cached difference
///
/// The zones take part because month and year differences follow the
/// calendar of the second instant's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffKey {
    pub a_nanos: i128,
    pub a_zone: &'static str,
    pub b_nanos: i128,
    pub b_zone: &'static str,
    pub unit: TimeUnit,
    pub rounding: Option<RoundingMode>,
}

impl DiffKey {
    /// Key for `a.diff(b, unit, rounding)`
    pub fn new(
        a: &ZonedInstant,
        b: &ZonedInstant,
        unit: TimeUnit,
        rounding: Option<RoundingMode>,
    ) -> Self {
        Self {
            a_nanos: a.epoch_nanos(),
            a_zone: a.zone().name(),
            b_nanos: b.epoch_nanos(),
            b_zone: b.zone().name(),
            unit,
            rounding,
        }
    }
}

/// Memoized `a - b` differences
#[derive(Debug)]
pub struct DiffCache {
    cache: ManagedCache<DiffKey, f64>,
    computations: AtomicU64,
}

impl DiffCache {
    /// Name reported to the coordinator
    pub const NAME: &'static str = "diff";

    /// Create a diff cache
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// for invalid settings.
    pub fn new(settings: CacheSettings) -> CacheResult<Self> {
        Ok(Self { cache: ManagedCache::new(Self::NAME, settings)?, computations: AtomicU64::new(0) })
    }

    /// `a - b` in `unit`, computed once per distinct key
    ///
    /// With `rounding == None` the fractional value is cached.
    ///
    /// # Errors
    /// Returns [`DomainError`] when the difference cannot be computed; the
    /// failure is not cached.
    pub fn diff(
        &self,
        a: &ZonedInstant,
        b: &ZonedInstant,
        unit: TimeUnit,
        rounding: Option<RoundingMode>,
    ) -> Result<f64, DomainError> {
        self.cache.get_or_compute(DiffKey::new(a, b, unit, rounding), || {
            self.computations.fetch_add(1, Ordering::Relaxed);
            a.diff(b, unit, rounding)
        })
    }

    /// Populate the cache around `seed`
    ///
    /// For every unit, the instants one unit before and after `seed` are
    /// diffed against `seed` in every unit. Returns the number of entries
    /// computed; instants that fall out of range are skipped.
    pub fn pre_warm(&self, seed: &ZonedInstant) -> usize {
        let mut warmed = 0;
        for offset_unit in TimeUnit::ALL {
            for amount in [-1, 1] {
                let Ok(other) = seed.add(amount, offset_unit) else { continue };
                for unit in TimeUnit::ALL {
                    if self.diff(&other, seed, unit, None).is_ok() {
                        warmed += 1;
                    }
                }
            }
        }
        debug!(cache = Self::NAME, warmed, len = self.cache.len(), "pre-warmed diff cache");
        warmed
    }

    /// Number of differences actually computed, cache misses included
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Underlying cache
    pub const fn inner(&self) -> &ManagedCache<DiffKey, f64> {
        &self.cache
    }

    /// Change the capacity
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// when `max_size` is 0.
    pub fn set_max_cache_size(&self, max_size: usize) -> CacheResult<usize> {
        self.cache.set_max_cache_size(max_size)
    }

    /// Allow or forbid optimizer-driven resizes
    pub fn set_dynamic_sizing(&self, enabled: bool) {
        self.cache.set_dynamic_sizing(enabled);
    }

    /// Whether the optimizer may resize this cache
    pub fn is_dynamic_sizing_enabled(&self) -> bool {
        self.cache.is_dynamic_sizing_enabled()
    }
}

impl DomainCache for DiffCache {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn get_stats(&self) -> CacheMetrics {
        self.cache.get_stats()
    }

    fn get_detailed_stats(&self) -> DetailedCacheMetrics {
        self.cache.get_detailed_stats()
    }

    fn get_efficiency_metrics(&self) -> CacheEfficiency {
        self.cache.get_efficiency_metrics()
    }

    fn clear(&self) {
        self.cache.clear();
    }

    fn optimize(&self) -> bool {
        self.cache.optimize()
    }

    fn reset(&self) {
        self.cache.reset();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::diff.
    use super::*;

    const NANOS_PER_DAY: i128 = 86_400_000_000_000;

    fn cache() -> DiffCache {
        DiffCache::new(CacheSettings::new(500)).unwrap()
    }

    /// Validates memoization.
    ///
    /// Assertions:
    /// - Confirms the second lookup is a hit and computes nothing.
    /// - Confirms the `a - b` sign convention.
    #[test]
    fn test_diff_memoized() {
        let cache = cache();
        let a = ZonedInstant::utc(0);
        let b = ZonedInstant::utc(3 * NANOS_PER_DAY);

        assert_eq!(cache.diff(&a, &b, TimeUnit::Day, None).unwrap(), -3.0);
        assert_eq!(cache.diff(&a, &b, TimeUnit::Day, None).unwrap(), -3.0);
        assert_eq!(cache.computations(), 1);

        let stats = cache.get_stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    /// Validates that every key component separates entries.
    ///
    /// Assertions:
    /// - Confirms unit, rounding and zone each produce distinct keys.
    #[test]
    fn test_keys_distinguish_options() {
        let cache = cache();
        let a = ZonedInstant::utc(NANOS_PER_DAY + 1);
        let b = ZonedInstant::utc(0);
        let paris = ZonedInstant::in_zone(0, "Europe/Paris").unwrap();

        cache.diff(&a, &b, TimeUnit::Day, None).unwrap();
        cache.diff(&a, &b, TimeUnit::Hour, None).unwrap();
        cache.diff(&a, &b, TimeUnit::Day, Some(RoundingMode::Floor)).unwrap();
        cache.diff(&a, &paris, TimeUnit::Day, None).unwrap();

        assert_eq!(cache.computations(), 4);
        assert_eq!(cache.inner().len(), 4);
    }

    /// Validates `pre_warm`.
    ///
    /// Assertions:
    /// - Confirms 2 offsets x 10 offset units x 10 diff units are computed.
    /// - Confirms a pre-warmed lookup is a hit.
    #[test]
    fn test_pre_warm() {
        let cache = cache();
        let seed = ZonedInstant::utc(1_700_000_000_000_000_000);

        assert_eq!(cache.pre_warm(&seed), 200);
        let before = cache.get_stats().hits;
        let next_day = seed.add(1, TimeUnit::Day).unwrap();
        assert_eq!(cache.diff(&next_day, &seed, TimeUnit::Hour, None).unwrap(), 24.0);
        assert_eq!(cache.get_stats().hits, before + 1);
    }
}
