//! Cache of comparison results

use atemporal_common::cache::{CacheMetrics, DetailedCacheMetrics};
use atemporal_common::CacheResult;
use atemporal_domain::{TimeUnit, ZonedInstant};
use tracing::debug;

use super::strategy::ComparisonStrategy;
use super::types::{
    ComparisonCacheEntry, ComparisonContext, ComparisonKey, ComparisonResult, ComparisonType,
};
use crate::cache::{CacheEfficiency, CacheSettings, DomainCache, ManagedCache, SharedClock};

/// Comparison results keyed by [`ComparisonKey`]
///
/// A hit bumps the entry's access count and last access time.
pub struct ComparisonCache {
    cache: ManagedCache<ComparisonKey, ComparisonCacheEntry>,
    clock: SharedClock,
}

impl ComparisonCache {
    /// Name reported to the coordinator
    pub const NAME: &'static str = "comparison";

    /// Create a comparison cache
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// for invalid settings.
    pub fn new(settings: CacheSettings) -> CacheResult<Self> {
        let clock = settings.clock.clone();
        Ok(Self { cache: ManagedCache::new(Self::NAME, settings)?, clock })
    }

    /// Cached result for `key`, recording the access on a hit
    pub fn lookup(&self, key: &ComparisonKey) -> Option<ComparisonResult> {
        let now = self.clock.system_time();
        self.cache.with_entry_mut(key, |entry| {
            entry.touch(now);
            entry.result.clone()
        })
    }

    /// Store `result` under `key`, then let the optimizer run if due
    pub fn store(&self, key: ComparisonKey, result: ComparisonResult) {
        let entry = ComparisonCacheEntry::new(result, self.clock.system_time());
        self.cache.insert(key, entry);
        self.cache.optimize();
    }

    /// Entry for `key` without touching recency, counters or access stats
    pub fn entry(&self, key: &ComparisonKey) -> Option<ComparisonCacheEntry> {
        self.cache.peek(key)
    }

    /// Populate the cache with fast path results around `seed`
    ///
    /// For every unit, the ordering predicates between `seed` and the
    /// instants one unit before and after it are stored. Returns the number
    /// of entries stored.
    pub fn pre_warm(&self, seed: &ZonedInstant) -> usize {
        const PREDICATES: [ComparisonType; 5] = [
            ComparisonType::IsBefore,
            ComparisonType::IsAfter,
            ComparisonType::IsSame,
            ComparisonType::IsSameOrBefore,
            ComparisonType::IsSameOrAfter,
        ];

        let mut warmed = 0;
        for unit in TimeUnit::ALL {
            for amount in [-1, 1] {
                let Ok(other) = seed.add(amount, unit) else { continue };
                for comparison in PREDICATES {
                    let ctx = ComparisonContext::new(*seed, other, comparison);
                    if let Ok(result) = ComparisonStrategy::FastPath.execute(&ctx) {
                        let entry = ComparisonCacheEntry::new(result, self.clock.system_time());
                        self.cache.insert(ctx.key(), entry);
                        warmed += 1;
                    }
                }
            }
        }
        debug!(cache = Self::NAME, warmed, "pre-warmed comparison cache");
        warmed
    }

    /// Underlying cache
    pub const fn inner(&self) -> &ManagedCache<ComparisonKey, ComparisonCacheEntry> {
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

impl DomainCache for ComparisonCache {
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

impl std::fmt::Debug for ComparisonCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonCache").field("cache", &self.cache).finish_non_exhaustive()
    }
}
