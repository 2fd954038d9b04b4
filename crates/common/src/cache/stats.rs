//! Cache statistics and metrics snapshots
//!
//! [`CacheMetrics`] is the snapshot the optimizer reasons about. It is
//! recomputed on demand from the raw [`CacheCounters`] a cache keeps.
//! [`DetailedCacheMetrics`] adds the counters and the optimizer's view of the
//! cache for diagnostics.

use serde::{Deserialize, Serialize};

use super::optimizer::PerformanceRating;

/// Raw operation counters kept by a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCounters {
    /// Successful lookups
    pub hits: u64,
    /// Lookups for absent keys
    pub misses: u64,
    /// Insert or update operations
    pub sets: u64,
    /// Entries removed to respect capacity
    pub evictions: u64,
}

/// Point-in-time usage snapshot of a bounded cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Successful lookups
    pub hits: u64,
    /// Lookups for absent keys
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 with no lookups
    pub hit_ratio: f64,
    /// Live entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// `size / max_size`
    pub utilization: f64,
}

impl CacheMetrics {
    /// Build a snapshot, deriving the ratios
    pub fn new(hits: u64, misses: u64, size: usize, max_size: usize) -> Self {
        let total = hits + misses;
        let hit_ratio = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        let utilization = if max_size == 0 { 0.0 } else { size as f64 / max_size as f64 };
        Self { hits, misses, hit_ratio, size, max_size, utilization }
    }

    /// Total number of lookups (hits + misses)
    pub const fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Miss ratio, `1 - hit_ratio` once any lookup happened
    pub fn miss_ratio(&self) -> f64 {
        if self.total_accesses() == 0 {
            0.0
        } else {
            1.0 - self.hit_ratio
        }
    }

    /// Combine several snapshots into one aggregate
    ///
    /// Counts and sizes are summed; ratios are recomputed from the sums.
    pub fn total<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let (hits, misses, size, max_size) =
            metrics.into_iter().fold((0, 0, 0, 0), |(h, m, s, x), metrics| {
                (h + metrics.hits, m + metrics.misses, s + metrics.size, x + metrics.max_size)
            });
        Self::new(hits, misses, size, max_size)
    }
}

/// Metrics plus counters and optimizer assessment for one cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedCacheMetrics {
    /// Usage snapshot
    #[serde(flatten)]
    pub metrics: CacheMetrics,
    /// Insert or update operations
    pub sets: u64,
    /// Capacity-driven evictions
    pub evictions: u64,
    /// Optimizer efficiency score in `[0, 100]`
    pub efficiency_score: u32,
    /// Optimizer classification of the hit ratio
    pub performance: PerformanceRating,
    /// Whether the optimizer may resize this cache
    pub dynamic_sizing: bool,
    /// Size the optimizer would pick right now
    pub recommended_size: usize,
}

impl DetailedCacheMetrics {
    /// Evictions per lookup, 0 with no lookups
    pub fn eviction_rate(&self) -> f64 {
        let total = self.metrics.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.evictions as f64 / total as f64
        }
    }
}
