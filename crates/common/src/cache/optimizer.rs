//! Heuristic cache sizing
//!
//! [`CacheOptimizer`] turns a [`CacheMetrics`] snapshot into a resize
//! decision, an efficiency score and human readable recommendations. The
//! functions are pure over the metrics and the current
//! [`CacheOptimizerConfig`].
//!
//! The optimizer is a cheap cloneable handle: every clone shares one
//! configuration, so a registry owns a single optimizer and hands it to each
//! cache it creates. Configuration changes are visible to all of them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
#[cfg(feature = "observability")]
use tracing::{debug, warn};

use super::config::RuntimeProfile;
use super::stats::CacheMetrics;
use crate::error::{CacheError, CacheResult};

/// Distance from the target hit ratio that triggers a resize
const HIT_RATIO_TOLERANCE: f64 = 0.2;
/// Utilization below which a cache is considered oversized
const LOW_UTILIZATION: f64 = 0.2;
/// Utilization above which a cache is considered undersized
const HIGH_UTILIZATION: f64 = 0.95;

/// Tuning knobs for [`CacheOptimizer`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptimizerConfig {
    /// Smallest size the optimizer shrinks to
    pub min_cache_size: usize,
    /// Largest size the optimizer grows to
    pub max_cache_size: usize,
    /// Desired hit ratio
    pub target_hit_ratio: f64,
    /// Multiplier applied when growing
    pub growth_factor: f64,
    /// Multiplier applied when shrinking
    pub shrink_factor: f64,
    /// Lookups required before any decision is made
    pub min_samples_for_optimization: u64,
}

impl Default for CacheOptimizerConfig {
    fn default() -> Self {
        Self {
            min_cache_size: 10,
            max_cache_size: 1000,
            target_hit_ratio: 0.8,
            growth_factor: 1.5,
            shrink_factor: 0.8,
            min_samples_for_optimization: 100,
        }
    }
}

impl CacheOptimizerConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheOptimizerConfigBuilder {
        CacheOptimizerConfigBuilder::default()
    }

    /// Defaults for `profile`
    ///
    /// The testing profile only needs 10 samples before optimizing.
    pub fn for_profile(profile: RuntimeProfile) -> Self {
        match profile {
            RuntimeProfile::Production => Self::default(),
            RuntimeProfile::Testing => Self { min_samples_for_optimization: 10, ..Self::default() },
        }
    }

    /// Check every field against its allowed range
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] naming the first invalid
    /// field.
    pub fn validate(&self) -> CacheResult<()> {
        if self.min_cache_size == 0 {
            return Err(CacheError::invalid_config("min_cache_size", "must be at least 1"));
        }
        if self.max_cache_size < self.min_cache_size {
            return Err(CacheError::invalid_config(
                "max_cache_size",
                format!(
                    "must be >= min_cache_size ({}), got {}",
                    self.min_cache_size, self.max_cache_size
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.target_hit_ratio) {
            return Err(CacheError::invalid_config(
                "target_hit_ratio",
                format!("must be within [0, 1], got {}", self.target_hit_ratio),
            ));
        }
        if !(self.growth_factor.is_finite() && self.growth_factor > 1.0) {
            return Err(CacheError::invalid_config(
                "growth_factor",
                format!("must be greater than 1, got {}", self.growth_factor),
            ));
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor <= 1.0) {
            return Err(CacheError::invalid_config(
                "shrink_factor",
                format!("must be within (0, 1], got {}", self.shrink_factor),
            ));
        }
        Ok(())
    }
}

/// Builder for [`CacheOptimizerConfig`]
#[derive(Debug, Default)]
pub struct CacheOptimizerConfigBuilder {
    config: CacheOptimizerConfig,
}

impl CacheOptimizerConfigBuilder {
    /// Start from the defaults of `profile`
    pub fn profile(mut self, profile: RuntimeProfile) -> Self {
        self.config = CacheOptimizerConfig::for_profile(profile);
        self
    }

    /// Set the smallest size the optimizer shrinks to
    pub fn min_cache_size(mut self, size: usize) -> Self {
        self.config.min_cache_size = size;
        self
    }

    /// Set the largest size the optimizer grows to
    pub fn max_cache_size(mut self, size: usize) -> Self {
        self.config.max_cache_size = size;
        self
    }

    /// Set the desired hit ratio
    pub fn target_hit_ratio(mut self, ratio: f64) -> Self {
        self.config.target_hit_ratio = ratio;
        self
    }

    /// Set the growth multiplier
    pub fn growth_factor(mut self, factor: f64) -> Self {
        self.config.growth_factor = factor;
        self
    }

    /// Set the shrink multiplier
    pub fn shrink_factor(mut self, factor: f64) -> Self {
        self.config.shrink_factor = factor;
        self
    }

    /// Set the sample threshold
    pub fn min_samples_for_optimization(mut self, samples: u64) -> Self {
        self.config.min_samples_for_optimization = samples;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] for out-of-range fields.
    pub fn build(self) -> CacheResult<CacheOptimizerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Coarse classification of a cache's hit ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceRating {
    /// Hit ratio below 0.5
    Poor,
    /// Hit ratio of at least 0.5
    Fair,
    /// Hit ratio of at least 0.7
    Good,
    /// Hit ratio of at least 0.9
    Excellent,
}

impl PerformanceRating {
    /// Rating for a hit ratio
    pub fn from_hit_ratio(hit_ratio: f64) -> Self {
        if hit_ratio >= 0.9 {
            Self::Excellent
        } else if hit_ratio >= 0.7 {
            Self::Good
        } else if hit_ratio >= 0.5 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Fair => write!(f, "fair"),
            Self::Poor => write!(f, "poor"),
        }
    }
}

/// Rating plus recommendations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    /// Hit ratio classification
    pub rating: PerformanceRating,
    /// Human readable suggestions
    pub recommendations: Vec<String>,
}

/// Summary report combining score, rating and resize advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationInsights {
    /// Efficiency score in `[0, 100]`
    pub current_efficiency: u32,
    /// Coarse estimate of achievable score gain
    pub potential_improvement: u32,
    /// Observations about the current state
    pub key_insights: Vec<String>,
    /// Suggested actions
    pub action_items: Vec<String>,
}

/// Shared handle to the sizing heuristics and their configuration
#[derive(Debug, Clone)]
pub struct CacheOptimizer {
    config: Arc<RwLock<CacheOptimizerConfig>>,
    defaults: CacheOptimizerConfig,
}

impl Default for CacheOptimizer {
    fn default() -> Self {
        let defaults = CacheOptimizerConfig::default();
        Self { config: Arc::new(RwLock::new(defaults)), defaults }
    }
}

impl CacheOptimizer {
    /// Create an optimizer; `config` also becomes the reset target
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] for an invalid config.
    pub fn new(config: CacheOptimizerConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self { config: Arc::new(RwLock::new(config)), defaults: config })
    }

    /// Optimizer with the defaults of `profile`
    pub fn for_profile(profile: RuntimeProfile) -> Self {
        let defaults = CacheOptimizerConfig::for_profile(profile);
        Self { config: Arc::new(RwLock::new(defaults)), defaults }
    }

    /// Current configuration
    pub fn config(&self) -> CacheOptimizerConfig {
        *self.config.read()
    }

    /// Replace the configuration for every holder of this handle
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`]; the previous
    /// configuration stays in place.
    pub fn set_config(&self, config: CacheOptimizerConfig) -> CacheResult<()> {
        if let Err(err) = config.validate() {
            #[cfg(feature = "observability")]
            warn!(parameter = err.parameter(), error = %err, "rejected optimizer configuration");
            return Err(err);
        }
        *self.config.write() = config;
        Ok(())
    }

    /// Modify the configuration in place
    ///
    /// The change is validated before it becomes visible.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] when the result is
    /// invalid; the previous configuration stays in place.
    pub fn update_config<F>(&self, update: F) -> CacheResult<()>
    where
        F: FnOnce(&mut CacheOptimizerConfig),
    {
        let mut guard = self.config.write();
        let mut candidate = *guard;
        update(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }

    /// Restore the configuration this optimizer was created with
    pub fn reset_config(&self) {
        *self.config.write() = self.defaults;
    }

    /// Size this cache should have given `metrics`
    ///
    /// Grows by `growth_factor` (capped at `max_cache_size`) while the hit
    /// ratio is below target. Shrinks by `shrink_factor` when utilization is
    /// under half, never below `min_cache_size` or `size + 5`. Returns
    /// `current_size` unchanged until enough samples were observed.
    pub fn calculate_optimal_size(&self, metrics: &CacheMetrics, current_size: usize) -> usize {
        let config = self.config();
        if metrics.total_accesses() < config.min_samples_for_optimization {
            return current_size;
        }

        let optimal = if metrics.hit_ratio < config.target_hit_ratio {
            let grown = (current_size as f64 * config.growth_factor).ceil() as usize;
            grown.min(config.max_cache_size)
        } else if metrics.utilization < 0.5 && metrics.size > config.min_cache_size {
            let shrunk = (current_size as f64 * config.shrink_factor).ceil() as usize;
            shrunk.max(config.min_cache_size).max(metrics.size + 5)
        } else {
            current_size
        };

        #[cfg(feature = "observability")]
        if optimal != current_size {
            debug!(
                current_size,
                optimal,
                hit_ratio = metrics.hit_ratio,
                utilization = metrics.utilization,
                "optimizer proposed a new cache size"
            );
        }

        optimal
    }

    /// Whether the metrics are far enough off target to justify a resize
    pub fn should_resize(&self, metrics: &CacheMetrics) -> bool {
        let config = self.config();
        if metrics.total_accesses() < config.min_samples_for_optimization {
            return false;
        }
        (metrics.hit_ratio - config.target_hit_ratio).abs() > HIT_RATIO_TOLERANCE
            || metrics.utilization < LOW_UTILIZATION
            || metrics.utilization > HIGH_UTILIZATION
    }

    /// Weighted efficiency score in `[0, 100]`
    ///
    /// 70% hit ratio, 20% banded utilization, 10% size relative to the
    /// configured maximum.
    pub fn calculate_efficiency_score(&self, metrics: &CacheMetrics) -> u32 {
        let config = self.config();
        let hit_score = metrics.hit_ratio * 100.0;
        let utilization_score = utilization_band(metrics.utilization);
        let size_ratio = metrics.size as f64 / config.max_cache_size.max(1) as f64;
        let size_score = (100.0 - size_ratio * 50.0).max(0.0);

        let score = 0.7 * hit_score + 0.2 * utilization_score + 0.1 * size_score;
        score.round().clamp(0.0, 100.0) as u32
    }

    /// Rate the hit ratio and collect recommendations
    pub fn analyze_performance(&self, metrics: &CacheMetrics) -> PerformanceAnalysis {
        let config = self.config();
        let rating = PerformanceRating::from_hit_ratio(metrics.hit_ratio);
        let mut recommendations = Vec::new();

        if metrics.utilization < 0.3 {
            recommendations.push(format!(
                "Cache utilization is low ({:.1}%). Consider reducing the cache size.",
                metrics.utilization * 100.0
            ));
        }
        if metrics.utilization > 0.9 {
            recommendations.push(format!(
                "Cache is nearly full ({:.1}%). Consider increasing the cache size.",
                metrics.utilization * 100.0
            ));
        }
        if metrics.max_size as f64 >= config.max_cache_size as f64 * 0.9 {
            recommendations.push(format!(
                "Cache size {} is approaching the configured maximum of {}.",
                metrics.max_size, config.max_cache_size
            ));
        }
        if metrics.total_accesses() > 0 && rating == PerformanceRating::Poor {
            recommendations.push(format!(
                "Hit ratio is low ({:.1}%). Review key construction or increase the cache size.",
                metrics.hit_ratio * 100.0
            ));
        }

        PerformanceAnalysis { rating, recommendations }
    }

    /// Combined score, rating and resize advice
    pub fn get_optimization_insights(&self, metrics: &CacheMetrics) -> OptimizationInsights {
        let current_efficiency = self.calculate_efficiency_score(metrics);
        let analysis = self.analyze_performance(metrics);
        let resize = self.should_resize(metrics);

        let key_insights = vec![
            format!("Cache performance is {}", analysis.rating),
            format!("Hit ratio: {:.1}%", metrics.hit_ratio * 100.0),
            format!(
                "Utilization: {:.1}% ({}/{})",
                metrics.utilization * 100.0,
                metrics.size,
                metrics.max_size
            ),
        ];

        let mut action_items = Vec::new();
        if resize {
            let optimal = self.calculate_optimal_size(metrics, metrics.max_size);
            action_items.push(format!("Resize cache from {} to {optimal}", metrics.max_size));
        }
        action_items.extend(analysis.recommendations);

        OptimizationInsights {
            current_efficiency,
            potential_improvement: if resize { 15 } else { 5 },
            key_insights,
            action_items,
        }
    }
}

fn utilization_band(utilization: f64) -> f64 {
    if (0.6..=0.8).contains(&utilization) {
        100.0
    } else if (0.4..=0.9).contains(&utilization) {
        80.0
    } else if (0.2..=0.95).contains(&utilization) {
        50.0
    } else {
        30.0
    }
}
