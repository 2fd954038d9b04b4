//! Resizable cache configuration and builder
//!
//! This module provides the runtime profile that decides how strict
//! resize-interval validation is, and the construction parameters for a
//! [`ResizableCache`](super::ResizableCache).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::lru::validate_capacity;
use crate::error::{CacheError, CacheResult};

/// Default interval between optimizer-driven resizes
pub const DEFAULT_RESIZE_INTERVAL: Duration = Duration::from_secs(60);

/// Shortest resize interval accepted by the production profile
pub const MIN_PRODUCTION_RESIZE_INTERVAL: Duration = Duration::from_millis(1000);

/// Default capacity of a resizable cache
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Validation strictness for cache timing and optimizer sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeProfile {
    /// Minimum resize interval of one second, 100 samples before optimizing
    #[default]
    Production,
    /// Any resize interval, 10 samples before optimizing
    Testing,
}

impl RuntimeProfile {
    /// Shortest resize interval allowed under this profile
    pub const fn min_resize_interval(self) -> Duration {
        match self {
            Self::Production => MIN_PRODUCTION_RESIZE_INTERVAL,
            Self::Testing => Duration::ZERO,
        }
    }

    /// Check `interval` against this profile
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] when the interval is below
    /// [`min_resize_interval`](Self::min_resize_interval).
    pub fn validate_resize_interval(self, interval: Duration) -> CacheResult<()> {
        let minimum = self.min_resize_interval();
        if interval < minimum {
            return Err(CacheError::invalid_config(
                "resize_interval",
                format!(
                    "must be at least {}ms in the {self:?} profile, got {}ms",
                    minimum.as_millis(),
                    interval.as_millis()
                ),
            ));
        }
        Ok(())
    }
}

/// Construction parameters for a resizable cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizableCacheConfig {
    /// Initial capacity
    pub max_size: usize,
    /// Minimum time between resizes
    pub resize_interval: Duration,
    /// Validation profile
    pub profile: RuntimeProfile,
}

impl Default for ResizableCacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            resize_interval: DEFAULT_RESIZE_INTERVAL,
            profile: RuntimeProfile::Production,
        }
    }
}

impl ResizableCacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResizableCacheConfigBuilder {
        ResizableCacheConfigBuilder::default()
    }

    /// Defaults with the given capacity
    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size, ..Self::default() }
    }

    /// Check size and interval
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] for a zero size or an
    /// interval the profile does not allow.
    pub fn validate(&self) -> CacheResult<()> {
        validate_capacity(self.max_size)?;
        self.profile.validate_resize_interval(self.resize_interval)
    }
}

/// Builder for [`ResizableCacheConfig`] with fluent API
#[derive(Debug, Default)]
pub struct ResizableCacheConfigBuilder {
    config: ResizableCacheConfig,
}

impl ResizableCacheConfigBuilder {
    /// Set the initial capacity
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.max_size = size;
        self
    }

    /// Set the minimum time between resizes
    pub fn resize_interval(mut self, interval: Duration) -> Self {
        self.config.resize_interval = interval;
        self
    }

    /// Set the validation profile
    pub fn profile(mut self, profile: RuntimeProfile) -> Self {
        self.config.profile = profile;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] for invalid values.
    pub fn build(self) -> CacheResult<ResizableCacheConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::config.
    use super::*;

    /// Validates `ResizableCacheConfig::default`.
    ///
    /// Assertions:
    /// - Confirms the 60 second default interval and production profile.
    /// - Ensures the default validates.
    #[test]
    fn test_default_config() {
        let config = ResizableCacheConfig::default();
        assert_eq!(config.resize_interval, Duration::from_secs(60));
        assert_eq!(config.profile, RuntimeProfile::Production);
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert!(config.validate().is_ok());
    }

    /// Validates interval limits per profile.
    ///
    /// Assertions:
    /// - Ensures 999ms is rejected in production.
    /// - Confirms 1000ms is accepted in production.
    /// - Confirms 0ms is accepted in testing.
    #[test]
    fn test_profile_interval_limits() {
        let err = RuntimeProfile::Production
            .validate_resize_interval(Duration::from_millis(999))
            .unwrap_err();
        assert_eq!(err.parameter(), "resize_interval");
        assert!(RuntimeProfile::Production.validate_resize_interval(Duration::from_secs(1)).is_ok());
        assert!(RuntimeProfile::Testing.validate_resize_interval(Duration::ZERO).is_ok());
    }

    /// Validates the builder.
    ///
    /// Assertions:
    /// - Confirms builder values are applied.
    /// - Ensures a zero size is rejected.
    #[test]
    fn test_builder() {
        let config = ResizableCacheConfig::builder()
            .max_size(25)
            .resize_interval(Duration::from_millis(10))
            .profile(RuntimeProfile::Testing)
            .build()
            .unwrap();
        assert_eq!(config.max_size, 25);
        assert_eq!(config.resize_interval, Duration::from_millis(10));

        let err = ResizableCacheConfig::builder().max_size(0).build().unwrap_err();
        assert_eq!(err.parameter(), "max_size");
    }

    /// Validates profile serialization.
    ///
    /// Assertions:
    /// - Confirms lowercase serde names.
    #[test]
    fn test_profile_serde() {
        assert_eq!(serde_json::to_string(&RuntimeProfile::Testing).unwrap(), "\"testing\"");
        let parsed: RuntimeProfile = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(parsed, RuntimeProfile::Production);
    }
}
