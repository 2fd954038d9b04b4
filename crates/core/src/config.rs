//! Registry configuration
//!
//! [`RegistryConfig`] describes every cache a
//! [`CacheRegistry`](crate::registry::CacheRegistry) creates. It can be built
//! in code through [`RegistryConfig::builder`] or loaded from TOML:
//!
//! ```toml
//! profile = "production"
//! formatter_cache_size = 50
//! diff_cache_size = 500
//! comparison_cache_size = 1000
//! dynamic_sizing = true
//! resize_interval_ms = 60000
//!
//! [optimizer]
//! max_cache_size = 2000
//! target_hit_ratio = 0.85
//! ```
//!
//! Missing fields take their defaults. Invalid values are rejected, never
//! clamped.

use std::time::Duration;

use atemporal_common::cache::{CacheOptimizerConfig, RuntimeProfile};
use atemporal_common::{CacheError, CacheOptimizer};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheSettings, SharedClock};
use crate::errors::{RegistryError, RegistryResult};

/// Initial formatter cache size, per formatter kind
pub const DEFAULT_FORMATTER_CACHE_SIZE: usize = 50;
/// Initial diff cache size
pub const DEFAULT_DIFF_CACHE_SIZE: usize = 500;
/// Initial comparison cache size
pub const DEFAULT_COMPARISON_CACHE_SIZE: usize = 1000;
/// Default resize interval in milliseconds
pub const DEFAULT_RESIZE_INTERVAL_MS: u64 = 60_000;

/// Settings for every cache of a registry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Validation profile
    pub profile: RuntimeProfile,
    pub formatter_cache_size: usize,
    pub diff_cache_size: usize,
    pub comparison_cache_size: usize,
    /// Whether caches start with dynamic sizing enabled
    pub dynamic_sizing: bool,
    /// Minimum time between optimizer-driven resizes
    pub resize_interval_ms: u64,
    /// Shared optimizer tuning, the `[optimizer]` table
    pub optimizer: CacheOptimizerConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            profile: RuntimeProfile::Production,
            formatter_cache_size: DEFAULT_FORMATTER_CACHE_SIZE,
            diff_cache_size: DEFAULT_DIFF_CACHE_SIZE,
            comparison_cache_size: DEFAULT_COMPARISON_CACHE_SIZE,
            dynamic_sizing: true,
            resize_interval_ms: DEFAULT_RESIZE_INTERVAL_MS,
            optimizer: CacheOptimizerConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration builder
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// Testing profile with a 100ms resize interval
    pub fn for_testing() -> Self {
        Self {
            profile: RuntimeProfile::Testing,
            optimizer: CacheOptimizerConfig::for_profile(RuntimeProfile::Testing),
            resize_interval_ms: 100,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`RegistryError::Parse`] for malformed TOML and
    /// [`RegistryError::Cache`] for invalid values.
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| RegistryError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns [`RegistryError::Parse`] if serialization fails.
    pub fn to_toml_string(&self) -> RegistryResult<String> {
        toml::to_string_pretty(self).map_err(|err| RegistryError::Parse(err.to_string()))
    }

    /// Resize interval as a [`Duration`]
    pub const fn resize_interval(&self) -> Duration {
        Duration::from_millis(self.resize_interval_ms)
    }

    /// Check every field
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] naming the first invalid
    /// field.
    pub fn validate(&self) -> Result<(), CacheError> {
        for (parameter, size) in [
            ("formatter_cache_size", self.formatter_cache_size),
            ("diff_cache_size", self.diff_cache_size),
            ("comparison_cache_size", self.comparison_cache_size),
        ] {
            if size == 0 {
                return Err(CacheError::invalid_config(parameter, "must be at least 1"));
            }
        }
        self.optimizer.validate()?;
        self.profile.validate_resize_interval(self.resize_interval())
    }

    /// Cache settings of `max_size` sharing `optimizer` and `clock`
    pub(crate) fn cache_settings(
        &self,
        max_size: usize,
        optimizer: &CacheOptimizer,
        clock: &SharedClock,
    ) -> CacheSettings {
        CacheSettings {
            max_size,
            resize_interval: self.resize_interval(),
            profile: self.profile,
            dynamic_sizing: self.dynamic_sizing,
            optimizer: optimizer.clone(),
            clock: clock.clone(),
        }
    }
}

/// Builder for [`RegistryConfig`]
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Switch profile, resetting the optimizer to that profile's defaults
    #[must_use]
    pub fn profile(mut self, profile: RuntimeProfile) -> Self {
        self.config.profile = profile;
        self.config.optimizer = CacheOptimizerConfig::for_profile(profile);
        self
    }

    #[must_use]
    pub fn optimizer(mut self, optimizer: CacheOptimizerConfig) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    #[must_use]
    pub fn formatter_cache_size(mut self, size: usize) -> Self {
        self.config.formatter_cache_size = size;
        self
    }

    #[must_use]
    pub fn diff_cache_size(mut self, size: usize) -> Self {
        self.config.diff_cache_size = size;
        self
    }

    #[must_use]
    pub fn comparison_cache_size(mut self, size: usize) -> Self {
        self.config.comparison_cache_size = size;
        self
    }

    #[must_use]
    pub fn dynamic_sizing(mut self, enabled: bool) -> Self {
        self.config.dynamic_sizing = enabled;
        self
    }

    /// Resize interval, stored with millisecond precision
    #[must_use]
    pub fn resize_interval(mut self, interval: Duration) -> Self {
        self.config.resize_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] naming the first invalid
    /// field.
    pub fn build(self) -> Result<RegistryConfig, CacheError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
