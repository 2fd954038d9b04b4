//! Lazily constructed domain caches
//!
//! A [`CacheRegistry`] owns one instance of every domain cache plus the
//! comparison engine. Each is created on first access from the registry's
//! [`RegistryConfig`], and all of them share one [`CacheOptimizer`] handle and
//! one clock. [`CacheRegistry::global`] is the process-wide instance with the
//! default configuration.

use std::fmt;
use std::sync::Arc;

use atemporal_common::{CacheOptimizer, SystemClock};
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::cache::{DiffCache, DomainCache, SharedClock};
use crate::comparison::{ComparisonCache, ComparisonEngine};
use crate::config::RegistryConfig;
use crate::errors::{RegistryError, RegistryResult};
use crate::format::{FormatterCache, FormatterProvider, PatternFormatterProvider};

static GLOBAL: Lazy<CacheRegistry> = Lazy::new(CacheRegistry::default);

/// Owner of the formatter, diff and comparison caches
pub struct CacheRegistry {
    config: RegistryConfig,
    optimizer: CacheOptimizer,
    clock: SharedClock,
    provider: Arc<dyn FormatterProvider>,
    formatter: OnceCell<FormatterCache>,
    diff: OnceCell<DiffCache>,
    comparison: OnceCell<Arc<ComparisonCache>>,
    engine: OnceCell<ComparisonEngine>,
}

impl CacheRegistry {
    /// Registry for `config` on the system clock with the pattern formatters
    ///
    /// # Errors
    /// Returns [`RegistryError::Cache`](crate::errors::RegistryError::Cache)
    /// when `config` is invalid.
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;
        let optimizer = CacheOptimizer::new(config.optimizer)?;
        Ok(Self::assemble(config, optimizer))
    }

    /// Registry with [`RegistryConfig::for_testing`]
    ///
    /// # Errors
    /// See [`new`](Self::new).
    pub fn for_testing() -> RegistryResult<Self> {
        Self::new(RegistryConfig::for_testing())
    }

    /// Process-wide registry with the default configuration
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    fn assemble(config: RegistryConfig, optimizer: CacheOptimizer) -> Self {
        Self {
            config,
            optimizer,
            clock: Arc::new(SystemClock),
            provider: Arc::new(PatternFormatterProvider),
            formatter: OnceCell::new(),
            diff: OnceCell::new(),
            comparison: OnceCell::new(),
            engine: OnceCell::new(),
        }
    }

    /// Drive every cache's resize gate from `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Create formatters through `provider`
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn FormatterProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Optimizer shared by every cache
    pub const fn optimizer(&self) -> &CacheOptimizer {
        &self.optimizer
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Formatter cache, created on first access
    ///
    /// # Errors
    /// Returns [`RegistryError::Cache`](crate::errors::RegistryError::Cache)
    /// if the cache cannot be created.
    pub fn formatter_cache(&self) -> RegistryResult<&FormatterCache> {
        self.formatter.get_or_try_init(|| {
            let settings = self.config.cache_settings(
                self.config.formatter_cache_size,
                &self.optimizer,
                &self.clock,
            );
            let cache = FormatterCache::new(&settings, self.provider.clone())?;
            debug!(cache = FormatterCache::NAME, max_size = settings.max_size, "created cache");
            Ok::<_, RegistryError>(cache)
        })
    }

    /// Diff cache, created on first access
    ///
    /// # Errors
    /// See [`formatter_cache`](Self::formatter_cache).
    pub fn diff_cache(&self) -> RegistryResult<&DiffCache> {
        self.diff.get_or_try_init(|| {
            let settings =
                self.config.cache_settings(self.config.diff_cache_size, &self.optimizer, &self.clock);
            let max_size = settings.max_size;
            let cache = DiffCache::new(settings)?;
            debug!(cache = DiffCache::NAME, max_size, "created cache");
            Ok::<_, RegistryError>(cache)
        })
    }

    /// Comparison cache, created on first access
    ///
    /// # Errors
    /// See [`formatter_cache`](Self::formatter_cache).
    pub fn comparison_cache(&self) -> RegistryResult<&Arc<ComparisonCache>> {
        self.comparison.get_or_try_init(|| {
            let settings = self.config.cache_settings(
                self.config.comparison_cache_size,
                &self.optimizer,
                &self.clock,
            );
            let max_size = settings.max_size;
            let cache = ComparisonCache::new(settings)?;
            debug!(cache = ComparisonCache::NAME, max_size, "created cache");
            Ok::<_, RegistryError>(Arc::new(cache))
        })
    }

    /// Comparison engine backed by [`comparison_cache`](Self::comparison_cache)
    ///
    /// # Errors
    /// See [`formatter_cache`](Self::formatter_cache).
    pub fn comparison_engine(&self) -> RegistryResult<&ComparisonEngine> {
        self.engine.get_or_try_init(|| {
            let cache = self.comparison_cache()?;
            Ok(ComparisonEngine::new(Arc::clone(cache)))
        })
    }

    /// Every domain cache, creating the missing ones
    ///
    /// # Errors
    /// See [`formatter_cache`](Self::formatter_cache).
    pub fn caches(&self) -> RegistryResult<[&dyn DomainCache; 3]> {
        let caches: [&dyn DomainCache; 3] =
            [self.formatter_cache()?, self.diff_cache()?, self.comparison_cache()?.as_ref()];
        Ok(caches)
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        let config = RegistryConfig::default();
        Self::assemble(config, CacheOptimizer::for_profile(config.profile))
    }
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("config", &self.config)
            .field("formatter", &self.formatter.get().is_some())
            .field("diff", &self.diff.get().is_some())
            .field("comparison", &self.comparison.get().is_some())
            .field("engine", &self.engine.get().is_some())
            .finish_non_exhaustive()
    }
}
