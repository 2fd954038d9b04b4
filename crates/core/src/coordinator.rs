//! Aggregated view over every domain cache of a registry

use std::collections::BTreeMap;

use atemporal_common::cache::{CacheMetrics, DetailedCacheMetrics};
use serde::Serialize;
use tracing::debug;

use crate::cache::CacheEfficiency;
use crate::errors::RegistryResult;
use crate::registry::CacheRegistry;

/// Per-cache metrics plus their sum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllCacheStats {
    /// Metrics keyed by cache name
    pub caches: BTreeMap<&'static str, CacheMetrics>,
    /// Counts and sizes summed over every cache
    pub total: CacheMetrics,
}

/// Stateless facade running the same operation on every domain cache
///
/// Caches the registry has not created yet are created on first use, so an
/// untouched cache shows up with zero metrics.
#[derive(Debug, Clone, Copy)]
pub struct GlobalCacheCoordinator<'a> {
    registry: &'a CacheRegistry,
}

impl<'a> GlobalCacheCoordinator<'a> {
    pub const fn new(registry: &'a CacheRegistry) -> Self {
        Self { registry }
    }

    pub const fn registry(&self) -> &'a CacheRegistry {
        self.registry
    }

    /// Metrics of every cache and their total
    ///
    /// # Errors
    /// Returns [`RegistryError`](crate::errors::RegistryError) if a cache
    /// cannot be created.
    pub fn get_all_stats(&self) -> RegistryResult<AllCacheStats> {
        let caches: BTreeMap<_, _> = self
            .registry
            .caches()?
            .into_iter()
            .map(|cache| (cache.name(), cache.get_stats()))
            .collect();
        let total = CacheMetrics::total(caches.values());
        Ok(AllCacheStats { caches, total })
    }

    /// Detailed metrics keyed by cache name
    ///
    /// # Errors
    /// See [`get_all_stats`](Self::get_all_stats).
    pub fn get_detailed_stats(&self) -> RegistryResult<BTreeMap<&'static str, DetailedCacheMetrics>> {
        Ok(self
            .registry
            .caches()?
            .into_iter()
            .map(|cache| (cache.name(), cache.get_detailed_stats()))
            .collect())
    }

    /// Efficiency assessment keyed by cache name
    ///
    /// # Errors
    /// See [`get_all_stats`](Self::get_all_stats).
    pub fn get_efficiency_metrics(&self) -> RegistryResult<BTreeMap<&'static str, CacheEfficiency>> {
        Ok(self
            .registry
            .caches()?
            .into_iter()
            .map(|cache| (cache.name(), cache.get_efficiency_metrics()))
            .collect())
    }

    /// Empty every cache
    ///
    /// # Errors
    /// See [`get_all_stats`](Self::get_all_stats).
    pub fn clear_all(&self) -> RegistryResult<()> {
        for cache in self.registry.caches()? {
            cache.clear();
        }
        debug!("cleared all caches");
        Ok(())
    }

    /// Run every cache's optimizer, returning how many actually resized
    ///
    /// # Errors
    /// See [`get_all_stats`](Self::get_all_stats).
    pub fn optimize_all(&self) -> RegistryResult<usize> {
        let resized = self.registry.caches()?.into_iter().filter(|cache| cache.optimize()).count();
        debug!(resized, "optimized all caches");
        Ok(resized)
    }

    /// Clear every cache and restore its default size and dynamic sizing
    ///
    /// # Errors
    /// See [`get_all_stats`](Self::get_all_stats).
    pub fn reset_all(&self) -> RegistryResult<()> {
        for cache in self.registry.caches()? {
            cache.reset();
        }
        debug!("reset all caches");
        Ok(())
    }
}

impl GlobalCacheCoordinator<'static> {
    /// Coordinator over [`CacheRegistry::global`]
    pub fn global() -> Self {
        Self::new(CacheRegistry::global())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for coordinator.
    use atemporal_domain::{RoundingMode, TimeUnit, ZonedInstant};

    use super::*;
    use crate::format::{FormatOptions, FormatterKind};

    /// Validates aggregation over untouched caches.
    ///
    /// Assertions:
    /// - Confirms all three caches are listed with zero metrics.
    /// - Confirms the total capacity sums every cache.
    #[test]
    fn test_untouched_stats() {
        let registry = CacheRegistry::for_testing().unwrap();
        let stats = GlobalCacheCoordinator::new(&registry).get_all_stats().unwrap();

        assert_eq!(stats.caches.len(), 3);
        assert!(stats.caches.values().all(|metrics| metrics.hits == 0 && metrics.size == 0));
        assert_eq!(stats.total.max_size, 4 * 50 + 500 + 1000);
        assert_eq!(stats.total.hit_ratio, 0.0);
    }

    /// Validates aggregation after use, then clearing and resetting.
    ///
    /// Assertions:
    /// - Confirms the total sums hits and sizes across caches.
    /// - Confirms `clear_all` empties every cache.
    /// - Confirms `reset_all` restores default sizes and dynamic sizing.
    #[test]
    fn test_clear_and_reset() {
        let registry = CacheRegistry::for_testing().unwrap();
        let coordinator = GlobalCacheCoordinator::new(&registry);
        let (a, b) = (ZonedInstant::utc(10), ZonedInstant::utc(0));

        let diff = registry.diff_cache().unwrap();
        diff.diff(&a, &b, TimeUnit::Nanosecond, Some(RoundingMode::Trunc)).unwrap();
        diff.diff(&a, &b, TimeUnit::Nanosecond, Some(RoundingMode::Trunc)).unwrap();
        registry
            .formatter_cache()
            .unwrap()
            .get_formatter(FormatterKind::Number, "en-US", &FormatOptions::new())
            .unwrap();

        let stats = coordinator.get_all_stats().unwrap();
        assert_eq!(stats.total.hits, 1);
        assert_eq!(stats.total.size, 2);
        assert_eq!(stats.caches["diff"].hits, 1);

        coordinator.clear_all().unwrap();
        assert_eq!(coordinator.get_all_stats().unwrap().total.size, 0);

        diff.set_max_cache_size(20).unwrap();
        diff.set_dynamic_sizing(false);
        coordinator.reset_all().unwrap();
        assert_eq!(diff.inner().max_size(), 500);
        assert!(diff.is_dynamic_sizing_enabled());
    }

    /// Validates the detailed and efficiency views.
    ///
    /// Assertions:
    /// - Confirms both maps are keyed by every cache name.
    /// - Ensures caches without samples keep their size when optimized.
    #[test]
    fn test_detailed_and_efficiency() {
        let registry = CacheRegistry::for_testing().unwrap();
        let coordinator = GlobalCacheCoordinator::new(&registry);

        let detailed = coordinator.get_detailed_stats().unwrap();
        let efficiency = coordinator.get_efficiency_metrics().unwrap();
        let names: Vec<_> = detailed.keys().copied().collect();

        assert_eq!(names, vec!["comparison", "diff", "formatter"]);
        assert_eq!(efficiency.keys().copied().collect::<Vec<_>>(), names);
        assert_eq!(coordinator.optimize_all().unwrap(), 0);
    }
}
