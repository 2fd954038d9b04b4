//! Shared, self-optimizing cache used by every domain cache
//!
//! [`ManagedCache`] puts a [`ResizableCache`] behind a single lock and wires
//! it to the registry's [`CacheOptimizer`]. Lookups, inserts, resizes and the
//! resize gate all run under that lock, so a reader never observes a cache in
//! the middle of a resize.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atemporal_common::cache::utils::CacheHealthReport;
use atemporal_common::cache::{
    CacheMetrics, CacheOptimizer, DetailedCacheMetrics, OptimizationInsights, PerformanceAnalysis,
    PerformanceRating, ResizableCache, ResizableCacheConfig, RuntimeProfile,
    DEFAULT_RESIZE_INTERVAL,
};
use atemporal_common::{CacheResult, Clock, SystemClock};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

/// Clock handle shared by every cache of a registry
pub type SharedClock = Arc<dyn Clock>;

/// Construction parameters for a [`ManagedCache`]
#[derive(Clone)]
pub struct CacheSettings {
    /// Initial capacity, also the size restored by `reset`
    pub max_size: usize,
    /// Minimum time between optimizer-driven resizes
    pub resize_interval: Duration,
    /// Validation profile for the resize interval
    pub profile: RuntimeProfile,
    /// Whether the optimizer may resize the cache
    pub dynamic_sizing: bool,
    /// Optimizer shared with the rest of the registry
    pub optimizer: CacheOptimizer,
    /// Clock driving the resize gate
    pub clock: SharedClock,
}

impl CacheSettings {
    /// Production settings of `max_size` on the system clock
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            resize_interval: DEFAULT_RESIZE_INTERVAL,
            profile: RuntimeProfile::Production,
            dynamic_sizing: true,
            optimizer: CacheOptimizer::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Same settings with a different capacity
    #[must_use]
    pub fn with_max_size(&self, max_size: usize) -> Self {
        Self { max_size, ..self.clone() }
    }

    fn resizable_config(&self) -> ResizableCacheConfig {
        ResizableCacheConfig {
            max_size: self.max_size,
            resize_interval: self.resize_interval,
            profile: self.profile,
        }
    }
}

impl fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSettings")
            .field("max_size", &self.max_size)
            .field("resize_interval", &self.resize_interval)
            .field("profile", &self.profile)
            .field("dynamic_sizing", &self.dynamic_sizing)
            .finish_non_exhaustive()
    }
}

/// Efficiency view of one cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEfficiency {
    /// Optimizer score in `[0, 100]`
    pub efficiency_score: u32,
    /// Rating and recommendations
    pub analysis: PerformanceAnalysis,
    /// Score, resize advice and action items
    pub insights: OptimizationInsights,
    /// Health verdict
    pub health: CacheHealthReport,
}

impl CacheEfficiency {
    /// Evaluate `detailed` with `optimizer`
    pub fn evaluate(
        name: &str,
        optimizer: &CacheOptimizer,
        detailed: DetailedCacheMetrics,
    ) -> Self {
        let metrics = detailed.metrics;
        Self {
            efficiency_score: detailed.efficiency_score,
            analysis: optimizer.analyze_performance(&metrics),
            insights: optimizer.get_optimization_insights(&metrics),
            health: CacheHealthReport::new(name, detailed),
        }
    }
}

/// Operations the coordinator runs on every domain cache
pub trait DomainCache: Send + Sync {
    /// Name used in aggregated reports
    fn name(&self) -> &'static str;

    /// Usage snapshot
    fn get_stats(&self) -> CacheMetrics;

    /// Usage snapshot with counters and optimizer assessment
    fn get_detailed_stats(&self) -> DetailedCacheMetrics;

    /// Score, insights and health verdict
    fn get_efficiency_metrics(&self) -> CacheEfficiency;

    /// Drop every entry and reset counters
    fn clear(&self);

    /// Apply the optimizer if dynamic sizing is on and the gate is open
    ///
    /// Returns whether any capacity changed.
    fn optimize(&self) -> bool;

    /// Clear, restore the initial size and re-enable dynamic sizing
    fn reset(&self);
}

/// Thread-safe resizable cache tied to an optimizer
///
/// # Example
/// ```
/// use atemporal_core::cache::{CacheSettings, ManagedCache};
///
/// let cache: ManagedCache<u32, String> =
///     ManagedCache::new("example", CacheSettings::new(16)).unwrap();
/// let value = cache.get_or_compute(7, || Ok::<_, ()>("seven".to_string())).unwrap();
/// assert_eq!(value, "seven");
/// assert_eq!(cache.get_stats().misses, 1);
/// ```
pub struct ManagedCache<K, V> {
    name: &'static str,
    inner: Mutex<ResizableCache<K, V, SharedClock>>,
    optimizer: CacheOptimizer,
    dynamic_sizing: AtomicBool,
    default_size: usize,
}

impl<K, V> ManagedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache from `settings`
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// for a zero size or an interval the profile rejects.
    pub fn new(name: &'static str, settings: CacheSettings) -> CacheResult<Self> {
        let inner = ResizableCache::with_config(settings.resizable_config(), settings.clock)?;
        Ok(Self {
            name,
            inner: Mutex::new(inner),
            optimizer: settings.optimizer,
            dynamic_sizing: AtomicBool::new(settings.dynamic_sizing),
            default_size: settings.max_size,
        })
    }

    /// Cached value for `key`, computing and storing it on a miss
    ///
    /// The lock is released while `compute` runs; two threads missing on the
    /// same key may both compute, and the later insert wins.
    ///
    /// # Errors
    /// Propagates the error of `compute`; nothing is stored in that case.
    pub fn get_or_compute<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.inner.lock().get(&key).cloned() {
            return Ok(value);
        }

        let value = compute()?;
        self.inner.lock().set(key, value.clone());
        self.optimize();
        Ok(value)
    }

    /// Cached value for `key`, recording a hit or miss
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// Cached value for `key` without touching recency or counters
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }

    /// Whether `key` is cached, without touching recency or counters
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().has(key)
    }

    /// Store `value` under `key`
    pub fn insert(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    /// Run `f` on the cached value for `key`, recording a hit or miss
    pub fn with_entry_mut<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.inner.lock().get_mut(key).map(f)
    }

    /// Live entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Current capacity
    pub fn max_size(&self) -> usize {
        self.inner.lock().max_size()
    }

    /// Capacity restored by [`reset`](DomainCache::reset)
    pub const fn default_size(&self) -> usize {
        self.default_size
    }

    /// Optimizer consulted by this cache
    pub const fn optimizer(&self) -> &CacheOptimizer {
        &self.optimizer
    }

    /// Change the capacity, evicting the oldest entries that no longer fit
    ///
    /// Returns the number of evicted entries.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// when `max_size` is 0.
    pub fn set_max_cache_size(&self, max_size: usize) -> CacheResult<usize> {
        self.inner.lock().set_max_size(max_size)
    }

    /// Allow or forbid optimizer-driven resizes
    pub fn set_dynamic_sizing(&self, enabled: bool) {
        self.dynamic_sizing.store(enabled, Ordering::Relaxed);
    }

    /// Whether the optimizer may resize this cache
    pub fn is_dynamic_sizing_enabled(&self) -> bool {
        self.dynamic_sizing.load(Ordering::Relaxed)
    }

    /// Set the minimum time between optimizer-driven resizes
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// when the profile rejects the interval.
    pub fn set_resize_interval(&self, interval: Duration) -> CacheResult<()> {
        self.inner.lock().set_resize_interval(interval)
    }

    /// Usage snapshot
    pub fn get_stats(&self) -> CacheMetrics {
        self.inner.lock().metrics()
    }

    /// Usage snapshot with counters and optimizer assessment
    pub fn get_detailed_stats(&self) -> DetailedCacheMetrics {
        let cache = self.inner.lock();
        let metrics = cache.metrics();
        let counters = cache.counters();
        DetailedCacheMetrics {
            metrics,
            sets: counters.sets,
            evictions: counters.evictions,
            efficiency_score: self.optimizer.calculate_efficiency_score(&metrics),
            performance: PerformanceRating::from_hit_ratio(metrics.hit_ratio),
            dynamic_sizing: self.is_dynamic_sizing_enabled(),
            recommended_size: self.optimizer.calculate_optimal_size(&metrics, cache.max_size()),
        }
    }

    /// Score, insights and health verdict
    pub fn get_efficiency_metrics(&self) -> CacheEfficiency {
        CacheEfficiency::evaluate(self.name, &self.optimizer, self.get_detailed_stats())
    }

    /// Drop every entry and reset counters
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Apply the optimizer's size if dynamic sizing is on and the resize
    /// gate is open
    ///
    /// Opening the gate always restarts it, even when the size stays the
    /// same. Returns whether the capacity changed.
    pub fn optimize(&self) -> bool {
        if !self.is_dynamic_sizing_enabled() {
            return false;
        }

        let mut cache = self.inner.lock();
        if !cache.should_resize() {
            return false;
        }

        let current = cache.max_size();
        let optimal = self.optimizer.calculate_optimal_size(&cache.metrics(), current);
        cache.mark_resized();
        if optimal == current {
            return false;
        }

        match cache.set_max_size(optimal) {
            Ok(evicted) => {
                debug!(cache = self.name, from = current, to = optimal, evicted, "optimized cache size");
                true
            }
            Err(err) => {
                warn!(cache = self.name, error = %err, "optimizer proposed an invalid cache size");
                false
            }
        }
    }

    /// Clear, restore the initial size and re-enable dynamic sizing
    pub fn reset(&self) {
        let mut cache = self.inner.lock();
        cache.clear();
        if let Err(err) = cache.set_max_size(self.default_size) {
            warn!(cache = self.name, error = %err, "failed to restore default cache size");
        }
        cache.mark_resized();
        self.dynamic_sizing.store(true, Ordering::Relaxed);
    }
}

impl<K, V> DomainCache for ManagedCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_stats(&self) -> CacheMetrics {
        Self::get_stats(self)
    }

    fn get_detailed_stats(&self) -> DetailedCacheMetrics {
        Self::get_detailed_stats(self)
    }

    fn get_efficiency_metrics(&self) -> CacheEfficiency {
        Self::get_efficiency_metrics(self)
    }

    fn clear(&self) {
        Self::clear(self);
    }

    fn optimize(&self) -> bool {
        Self::optimize(self)
    }

    fn reset(&self) {
        Self::reset(self);
    }
}

impl<K, V> fmt::Debug for ManagedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedCache")
            .field("name", &self.name)
            .field("default_size", &self.default_size)
            .field("dynamic_sizing", &self.dynamic_sizing.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
