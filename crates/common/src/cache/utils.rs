//! Cache health diagnostics
//!
//! Turns a [`DetailedCacheMetrics`] snapshot into a health verdict with
//! recommendations, for diagnostics output and periodic logging.

use std::fmt;

use serde::{Deserialize, Serialize};
#[cfg(feature = "observability")]
use tracing::{info, warn};

use super::stats::DetailedCacheMetrics;

/// Lookups required before a low hit rate counts against a cache
const MIN_ACCESSES_FOR_HIT_RATE: u64 = 100;

/// Cache health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheHealth {
    /// Cache is operating normally
    Healthy,
    /// Cache hit rate is low, consider tuning
    LowHitRate,
    /// Cache is nearly full, consider increasing size
    NearCapacity,
    /// Cache has both low hit rate and near capacity
    Critical,
}

impl fmt::Display for CacheHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::LowHitRate => write!(f, "Low Hit Rate"),
            Self::NearCapacity => write!(f, "Near Capacity"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Cache health report with diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHealthReport {
    /// Name of the reported cache
    pub name: String,
    /// Overall health status
    pub health: CacheHealth,
    /// Snapshot the verdict was derived from
    pub stats: DetailedCacheMetrics,
    /// Recommendations for optimization
    pub recommendations: Vec<String>,
}

impl CacheHealthReport {
    /// Generate a health report
    ///
    /// # Thresholds
    /// - Low hit rate: < 50% after at least 100 lookups
    /// - Near capacity: > 85% full
    /// - High eviction rate: > 20% of lookups
    pub fn new(name: impl Into<String>, stats: DetailedCacheMetrics) -> Self {
        let metrics = &stats.metrics;
        let mut recommendations = Vec::new();

        let low_hit_rate =
            metrics.hit_ratio < 0.5 && metrics.total_accesses() > MIN_ACCESSES_FOR_HIT_RATE;
        if low_hit_rate {
            recommendations.push(format!(
                "Hit rate is {:.2}%. Consider increasing cache size.",
                metrics.hit_ratio * 100.0
            ));
        }

        let near_capacity = metrics.utilization > 0.85;
        if near_capacity {
            recommendations.push(format!(
                "Cache is {:.1}% full. Consider increasing max_size.",
                metrics.utilization * 100.0
            ));
        }

        let eviction_rate = stats.eviction_rate();
        if eviction_rate > 0.2 {
            recommendations.push(format!(
                "High eviction rate: {:.2}%. Cache may be too small for workload.",
                eviction_rate * 100.0
            ));
        }

        if !stats.dynamic_sizing && stats.recommended_size != metrics.max_size {
            recommendations.push(format!(
                "Dynamic sizing is disabled; optimizer suggests a size of {}.",
                stats.recommended_size
            ));
        }

        let health = match (low_hit_rate, near_capacity) {
            (true, true) => CacheHealth::Critical,
            (true, false) => CacheHealth::LowHitRate,
            (false, true) => CacheHealth::NearCapacity,
            (false, false) => CacheHealth::Healthy,
        };

        Self { name: name.into(), health, stats, recommendations }
    }

    /// Log the health report using tracing (requires `observability` feature)
    #[cfg(feature = "observability")]
    pub fn log(&self) {
        match self.health {
            CacheHealth::Healthy => {
                info!(
                    cache = %self.name,
                    health = %self.health,
                    hit_ratio = self.stats.metrics.hit_ratio,
                    size = self.stats.metrics.size,
                    "Cache health check: Healthy"
                );
            }
            CacheHealth::LowHitRate | CacheHealth::NearCapacity | CacheHealth::Critical => {
                warn!(
                    cache = %self.name,
                    health = %self.health,
                    hit_ratio = self.stats.metrics.hit_ratio,
                    size = self.stats.metrics.size,
                    max_size = self.stats.metrics.max_size,
                    "Cache health check: Issues detected"
                );
                for rec in &self.recommendations {
                    warn!(cache = %self.name, recommendation = %rec, "Cache optimization recommendation");
                }
            }
        }
    }
}

impl fmt::Display for CacheHealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = &self.stats.metrics;
        writeln!(f, "Cache Health Report: {}", self.name)?;
        writeln!(f, "===================")?;
        writeln!(f, "Status: {}", self.health)?;
        writeln!(f, "Performance: {}", self.stats.performance)?;
        writeln!(f, "Efficiency: {}/100", self.stats.efficiency_score)?;
        writeln!(f)?;
        writeln!(f, "Statistics:")?;
        writeln!(f, "  Size: {}/{}", metrics.size, metrics.max_size)?;
        writeln!(f, "  Hits: {}", metrics.hits)?;
        writeln!(f, "  Misses: {}", metrics.misses)?;
        writeln!(f, "  Hit Rate: {:.2}%", metrics.hit_ratio * 100.0)?;
        writeln!(f, "  Sets: {}", self.stats.sets)?;
        writeln!(f, "  Evictions: {}", self.stats.evictions)?;
        writeln!(f, "  Fill: {:.1}%", metrics.utilization * 100.0)?;

        if !self.recommendations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recommendations:")?;
            for (i, rec) in self.recommendations.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, rec)?;
            }
        }

        Ok(())
    }
}
