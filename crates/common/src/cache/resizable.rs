//! Bounded cache with runtime capacity changes and a resize gate
//!
//! [`ResizableCache`] wraps a [`BoundedCache`] and adds two things: the
//! capacity can change at runtime (shrinking evicts the oldest entries), and
//! a clock-driven gate tells callers when enough time has passed since the
//! last resize for the optimizer to run again.

use std::fmt;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

#[cfg(feature = "observability")]
use tracing::debug;

use super::config::{ResizableCacheConfig, RuntimeProfile};
use super::lru::BoundedCache;
use crate::error::CacheResult;
use crate::time::{Clock, SystemClock};

/// LRU cache whose capacity the optimizer may change
///
/// All [`BoundedCache`] operations are available through `Deref`.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use atemporal_common::cache::{ResizableCache, ResizableCacheConfig, RuntimeProfile};
/// use atemporal_common::time::MockClock;
///
/// let clock = MockClock::new();
/// let config = ResizableCacheConfig::builder()
///     .max_size(10)
///     .resize_interval(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// let mut cache: ResizableCache<u32, u32, MockClock> =
///     ResizableCache::with_config(config, clock.clone()).unwrap();
///
/// assert!(!cache.should_resize());
/// clock.advance(Duration::from_secs(5));
/// assert!(cache.should_resize());
///
/// cache.set_max_size(20).unwrap();
/// cache.mark_resized();
/// assert!(!cache.should_resize());
/// ```
pub struct ResizableCache<K, V, C = SystemClock> {
    cache: BoundedCache<K, V>,
    clock: C,
    profile: RuntimeProfile,
    resize_interval: Duration,
    last_resize: Instant,
}

impl<K, V> ResizableCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    /// Production cache of `max_size` on the system clock
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError) when
    /// `max_size` is 0.
    pub fn new(max_size: usize) -> CacheResult<Self> {
        Self::with_config(ResizableCacheConfig::with_max_size(max_size), SystemClock)
    }
}

impl<K, V, C> ResizableCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Create a cache from `config` reading time from `clock`
    ///
    /// The resize gate starts closed: the first interval is measured from
    /// construction.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError) for an
    /// invalid size or interval.
    pub fn with_config(config: ResizableCacheConfig, clock: C) -> CacheResult<Self> {
        config.validate()?;
        let cache = BoundedCache::new(config.max_size)?;
        let last_resize = clock.now();
        Ok(Self {
            cache,
            clock,
            profile: config.profile,
            resize_interval: config.resize_interval,
            last_resize,
        })
    }

    /// Change the capacity, evicting the oldest entries that no longer fit
    ///
    /// Returns the number of evicted entries.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError) when
    /// `max_size` is 0; the cache is left untouched.
    pub fn set_max_size(&mut self, max_size: usize) -> CacheResult<usize> {
        let previous = self.cache.capacity();
        let evicted = self.cache.set_capacity(max_size)?;

        #[cfg(feature = "observability")]
        debug!(previous, max_size, evicted, len = self.cache.len(), "resized cache");
        #[cfg(not(feature = "observability"))]
        let _ = previous;

        Ok(evicted)
    }

    /// Set the minimum time between resizes
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError) when
    /// the interval is shorter than the profile allows.
    pub fn set_resize_interval(&mut self, interval: Duration) -> CacheResult<()> {
        self.profile.validate_resize_interval(interval)?;
        self.resize_interval = interval;
        Ok(())
    }

    /// Whether the resize interval has elapsed since the last resize
    pub fn should_resize(&self) -> bool {
        self.time_since_resize() >= self.resize_interval
    }

    /// Record that a resize decision was just made
    pub fn mark_resized(&mut self) {
        self.last_resize = self.clock.now();
    }

    /// Time elapsed since the last resize
    pub fn time_since_resize(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.last_resize)
    }
}

impl<K, V, C> ResizableCache<K, V, C> {
    /// Current capacity
    pub const fn max_size(&self) -> usize {
        self.cache.capacity()
    }

    /// Minimum time between resizes
    pub const fn resize_interval(&self) -> Duration {
        self.resize_interval
    }

    /// Validation profile
    pub const fn profile(&self) -> RuntimeProfile {
        self.profile
    }

    /// Clock driving the resize gate
    pub const fn clock(&self) -> &C {
        &self.clock
    }
}

impl<K, V, C> Deref for ResizableCache<K, V, C> {
    type Target = BoundedCache<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

impl<K, V, C> DerefMut for ResizableCache<K, V, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cache
    }
}

impl<K, V, C> fmt::Debug for ResizableCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizableCache")
            .field("cache", &self.cache)
            .field("profile", &self.profile)
            .field("resize_interval", &self.resize_interval)
            .finish_non_exhaustive()
    }
}
