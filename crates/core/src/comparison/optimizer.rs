//! Comparison engine analysis and tuning
//!
//! [`ComparisonOptimizer`] scores a [`ComparisonMetrics`] snapshot together
//! with the result cache's [`CacheMetrics`], turns the findings into
//! recommendations and can apply the safe ones to a live engine. Every
//! [`apply_optimizations`](ComparisonOptimizer::apply_optimizations) call is
//! kept in a bounded history.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use atemporal_common::cache::CacheMetrics;
use atemporal_common::SystemClock;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use super::engine::ComparisonEngine;
use super::types::ComparisonMetrics;
use crate::cache::SharedClock;

/// Records kept by [`ComparisonOptimizer`]
pub const HISTORY_LIMIT: usize = 50;

const LOW_FAST_PATH_RATIO: f64 = 0.3;
const HIGH_FAST_PATH_RATIO: f64 = 0.7;
const LOW_CACHE_HIT_RATIO: f64 = 0.5;
const HIGH_CACHE_HIT_RATIO: f64 = 0.8;
const MIN_CACHE_SAMPLES: u64 = 100;
const SLOW_COMPUTE: Duration = Duration::from_millis(1);
const FAST_COMPUTE: Duration = Duration::from_micros(100);

/// Normalized engine scores, each within `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyBreakdown {
    pub fast_path_ratio: f64,
    pub cache_hit_ratio: f64,
    /// 1 at zero average compute time, 0 at one millisecond or more
    pub compute_time_score: f64,
    /// Weighted blend of the three scores
    pub overall: f64,
}

/// Findings for one metrics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineAnalysis {
    pub efficiency: EfficiencyBreakdown,
    pub bottlenecks: Vec<String>,
    pub strengths: Vec<String>,
}

/// Urgency of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// What a recommendation proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Grow the comparison cache
    IncreaseCacheSize { from: usize, to: usize },
    /// Call sites pass units where raw ordering would do
    PreferUnitlessComparisons,
    /// Strategies take longer than expected
    ReduceComputeTime,
}

/// A typed tuning proposal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRecommendation {
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub description: String,
    pub impact: String,
    /// Whether it can be applied without caller involvement
    pub safe: bool,
}

/// One [`ComparisonOptimizer::apply_optimizations`] run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRecord {
    pub timestamp: SystemTime,
    pub recommendations: Vec<OptimizationRecommendation>,
    pub applied: Vec<OptimizationRecommendation>,
}

/// Analyzes and tunes a [`ComparisonEngine`]
pub struct ComparisonOptimizer {
    clock: SharedClock,
    history: Mutex<VecDeque<OptimizationRecord>>,
}

impl Default for ComparisonOptimizer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ComparisonOptimizer {
    /// Optimizer stamping records with `clock`
    pub fn new(clock: SharedClock) -> Self {
        Self { clock, history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)) }
    }

    /// Score the engine and list its bottlenecks and strengths
    pub fn analyze_performance(&self, metrics: &ComparisonMetrics, cache: &CacheMetrics) -> EngineAnalysis {
        let fast_path_ratio = metrics.fast_path_ratio();
        let cache_hit_ratio = metrics.cache_hit_ratio();
        let cache_samples = metrics.cache_hits + metrics.cache_misses;
        let average = metrics.average_compute_time;
        let compute_time_score =
            (1.0 - average.as_secs_f64() / SLOW_COMPUTE.as_secs_f64()).clamp(0.0, 1.0);
        let overall = fast_path_ratio * 0.3 + cache_hit_ratio * 0.4 + compute_time_score * 0.3;

        let mut bottlenecks = Vec::new();
        let mut strengths = Vec::new();
        let observed = metrics.total_comparisons > 0;

        if observed && fast_path_ratio < LOW_FAST_PATH_RATIO {
            bottlenecks.push(format!(
                "Low fast path usage: {:.1}% of comparisons",
                fast_path_ratio * 100.0
            ));
        } else if fast_path_ratio > HIGH_FAST_PATH_RATIO {
            strengths.push(format!("High fast path usage: {:.1}%", fast_path_ratio * 100.0));
        }

        if cache_samples > MIN_CACHE_SAMPLES && cache_hit_ratio < LOW_CACHE_HIT_RATIO {
            bottlenecks.push(format!(
                "Low cache hit ratio: {:.1}% over {cache_samples} lookups ({} of {} entries used)",
                cache_hit_ratio * 100.0,
                cache.size,
                cache.max_size
            ));
        } else if cache_hit_ratio > HIGH_CACHE_HIT_RATIO {
            strengths.push(format!("Excellent cache hit ratio: {:.1}%", cache_hit_ratio * 100.0));
        }

        if average > SLOW_COMPUTE {
            bottlenecks.push(format!("High average compute time: {average:?}"));
        } else if observed && average < FAST_COMPUTE {
            strengths.push(format!("Fast average compute time: {average:?}"));
        }

        EngineAnalysis {
            efficiency: EfficiencyBreakdown {
                fast_path_ratio,
                cache_hit_ratio,
                compute_time_score,
                overall,
            },
            bottlenecks,
            strengths,
        }
    }

    /// Human readable advice for the current snapshot
    pub fn generate_recommendations(
        &self,
        metrics: &ComparisonMetrics,
        cache: &CacheMetrics,
    ) -> Vec<String> {
        let analysis = self.analyze_performance(metrics, cache);
        let mut advice = Vec::new();
        let efficiency = analysis.efficiency;
        let observed = metrics.total_comparisons > 0;

        if observed && efficiency.fast_path_ratio < LOW_FAST_PATH_RATIO {
            advice.push(
                "Compare without a unit where raw ordering is sufficient to stay on the fast path"
                    .to_string(),
            );
        }
        if metrics.cache_hits + metrics.cache_misses > MIN_CACHE_SAMPLES
            && efficiency.cache_hit_ratio < LOW_CACHE_HIT_RATIO
        {
            advice.push(format!(
                "Increase the comparison cache size (currently {})",
                cache.max_size
            ));
        }
        if metrics.average_compute_time > SLOW_COMPUTE {
            advice.push(
                "Review unit comparisons on calendar units, they dominate compute time".to_string(),
            );
        }
        if advice.is_empty() {
            advice.push("Comparison engine performance is healthy".to_string());
        }
        advice
    }

    /// Typed proposals for the current snapshot
    ///
    /// Cache growth doubles the capacity, capped at `max_cache_size`, and is
    /// only proposed when that is an actual increase.
    pub fn generate_optimization_recommendations(
        &self,
        metrics: &ComparisonMetrics,
        cache: &CacheMetrics,
        max_cache_size: usize,
    ) -> Vec<OptimizationRecommendation> {
        let analysis = self.analyze_performance(metrics, cache);
        let efficiency = analysis.efficiency;
        let mut recommendations = Vec::new();

        let cache_samples = metrics.cache_hits + metrics.cache_misses;
        if cache_samples > MIN_CACHE_SAMPLES && efficiency.cache_hit_ratio < LOW_CACHE_HIT_RATIO {
            let from = cache.max_size;
            let to = from.saturating_mul(2).min(max_cache_size);
            if to > from {
                recommendations.push(OptimizationRecommendation {
                    kind: RecommendationKind::IncreaseCacheSize { from, to },
                    priority: RecommendationPriority::High,
                    description: format!("Grow the comparison cache from {from} to {to} entries"),
                    impact: format!(
                        "Hit ratio is {:.1}%, more capacity keeps repeated comparisons cached",
                        efficiency.cache_hit_ratio * 100.0
                    ),
                    safe: true,
                });
            }
        }

        if metrics.total_comparisons > 0 && efficiency.fast_path_ratio < LOW_FAST_PATH_RATIO {
            recommendations.push(OptimizationRecommendation {
                kind: RecommendationKind::PreferUnitlessComparisons,
                priority: RecommendationPriority::Medium,
                description: "Drop the unit from comparisons that only need raw ordering"
                    .to_string(),
                impact: format!(
                    "Only {:.1}% of comparisons use the fast path",
                    efficiency.fast_path_ratio * 100.0
                ),
                safe: false,
            });
        }

        if metrics.average_compute_time > SLOW_COMPUTE {
            recommendations.push(OptimizationRecommendation {
                kind: RecommendationKind::ReduceComputeTime,
                priority: RecommendationPriority::Low,
                description: "Reduce calendar unit truncation in hot comparisons".to_string(),
                impact: format!("Average compute time is {:?}", metrics.average_compute_time),
                safe: false,
            });
        }

        recommendations.sort_by_key(|recommendation| recommendation.priority);
        recommendations
    }

    /// Generate recommendations for `engine` and, when `auto_apply` is set,
    /// apply the safe ones
    ///
    /// The run is appended to the history, dropping the oldest record past
    /// [`HISTORY_LIMIT`].
    pub fn apply_optimizations(&self, engine: &ComparisonEngine, auto_apply: bool) -> OptimizationRecord {
        let metrics = engine.get_metrics();
        let cache = engine.get_cache_stats();
        let max_cache_size = engine.cache().inner().optimizer().config().max_cache_size;
        let recommendations =
            self.generate_optimization_recommendations(&metrics, &cache, max_cache_size);

        let mut applied = Vec::new();
        if auto_apply {
            for recommendation in recommendations.iter().filter(|r| r.safe) {
                let RecommendationKind::IncreaseCacheSize { to, .. } = recommendation.kind else {
                    continue;
                };
                match engine.set_max_cache_size(to) {
                    Ok(_) => applied.push(recommendation.clone()),
                    Err(err) => warn!(error = %err, size = to, "failed to resize comparison cache"),
                }
            }
        }
        if !applied.is_empty() {
            info!(
                applied = applied.len(),
                proposed = recommendations.len(),
                "applied comparison optimizations"
            );
        }

        let record =
            OptimizationRecord { timestamp: self.clock.system_time(), recommendations, applied };
        let mut history = self.history.lock();
        history.push_back(record.clone());
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
        record
    }

    /// Past runs, oldest first
    pub fn get_optimization_history(&self) -> Vec<OptimizationRecord> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Plain text report for `engine`
    pub fn generate_report(&self, engine: &ComparisonEngine) -> String {
        let metrics = engine.get_metrics();
        let cache = engine.get_cache_stats();
        let analysis = self.analyze_performance(&metrics, &cache);
        let efficiency = analysis.efficiency;

        let mut lines = vec![
            "Comparison Engine Report".to_string(),
            "========================".to_string(),
            format!("Total comparisons: {}", metrics.total_comparisons),
            format!("Average compute time: {:?}", metrics.average_compute_time),
            format!("Cache: {} / {} entries", cache.size, cache.max_size),
            String::new(),
            "Efficiency".to_string(),
            format!("  fast path ratio: {:.1}%", efficiency.fast_path_ratio * 100.0),
            format!("  cache hit ratio: {:.1}%", efficiency.cache_hit_ratio * 100.0),
            format!("  compute time score: {:.2}", efficiency.compute_time_score),
            format!("  overall: {:.2}", efficiency.overall),
        ];

        if !metrics.operation_breakdown.is_empty() {
            lines.push(String::new());
            lines.push("Operations".to_string());
            lines.extend(
                metrics.operation_breakdown.iter().map(|(op, count)| format!("  {op}: {count}")),
            );
        }
        for (title, items) in [("Bottlenecks", &analysis.bottlenecks), ("Strengths", &analysis.strengths)] {
            if items.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(title.to_string());
            lines.extend(items.iter().map(|item| format!("  - {item}")));
        }

        lines.push(String::new());
        lines.push("Recommendations".to_string());
        lines.extend(
            self.generate_recommendations(&metrics, &cache)
                .into_iter()
                .map(|advice| format!("  - {advice}")),
        );
        lines.push(format!("Optimization runs recorded: {}", self.history.lock().len()));
        lines.join("\n")
    }
}

impl fmt::Debug for ComparisonOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonOptimizer")
            .field("history", &self.history.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for comparison::optimizer.
    use atemporal_common::{Clock, MockClock};
    use atemporal_domain::{TimeUnit, ZonedInstant};

    use super::*;
    use crate::cache::CacheSettings;
    use crate::comparison::{ComparisonCache, ComparisonType};

    fn metrics(total: u64, fast: u64, hits: u64, misses: u64, average: Duration) -> ComparisonMetrics {
        ComparisonMetrics {
            total_comparisons: total,
            fast_path_hits: fast,
            cache_hits: hits,
            cache_misses: misses,
            total_compute_time: average * u32::try_from(total).unwrap(),
            average_compute_time: average,
            ..ComparisonMetrics::default()
        }
    }

    fn engine(size: usize) -> ComparisonEngine {
        ComparisonEngine::new(Arc::new(ComparisonCache::new(CacheSettings::new(size)).unwrap()))
    }

    /// Validates bottleneck detection.
    ///
    /// Assertions:
    /// - Confirms low fast path, low hit ratio and slow compute are all
    ///   reported.
    /// - Confirms the compute time score bottoms out at zero.
    #[test]
    fn test_analyze_bottlenecks() {
        let optimizer = ComparisonOptimizer::default();
        let snapshot = metrics(200, 20, 40, 160, Duration::from_millis(2));
        let cache = CacheMetrics::new(40, 160, 10, 10);

        let analysis = optimizer.analyze_performance(&snapshot, &cache);

        assert_eq!(analysis.bottlenecks.len(), 3);
        assert!(analysis.strengths.is_empty());
        assert_eq!(analysis.efficiency.compute_time_score, 0.0);
        assert!((analysis.efficiency.fast_path_ratio - 0.1).abs() < 1e-9);
        assert!((analysis.efficiency.overall - (0.1 * 0.3 + 0.2 * 0.4)).abs() < 1e-9);
    }

    /// Validates strength detection.
    ///
    /// Assertions:
    /// - Confirms high fast path, high hit ratio and fast compute are all
    ///   reported as strengths.
    /// - Ensures a low hit ratio with too few samples is not a bottleneck.
    #[test]
    fn test_analyze_strengths_and_sample_gate() {
        let optimizer = ComparisonOptimizer::default();
        let healthy = metrics(100, 90, 90, 10, Duration::from_micros(5));
        let analysis = optimizer.analyze_performance(&healthy, &CacheMetrics::default());
        assert_eq!(analysis.strengths.len(), 3);
        assert!(analysis.bottlenecks.is_empty());

        let sparse = metrics(50, 50, 10, 40, Duration::from_micros(5));
        let analysis = optimizer.analyze_performance(&sparse, &CacheMetrics::default());
        assert!(analysis.bottlenecks.is_empty());
    }

    /// Validates typed recommendations.
    ///
    /// Assertions:
    /// - Confirms cache growth doubles the size and is capped by the maximum.
    /// - Ensures growth is not proposed when already at the maximum.
    /// - Confirms only cache growth is safe and results are priority ordered.
    #[test]
    fn test_optimization_recommendations() {
        let optimizer = ComparisonOptimizer::default();
        let snapshot = metrics(200, 20, 40, 160, Duration::from_micros(5));

        let recommendations = optimizer.generate_optimization_recommendations(
            &snapshot,
            &CacheMetrics::new(40, 160, 600, 600),
            1000,
        );
        assert_eq!(recommendations.len(), 2);
        assert_eq!(
            recommendations[0].kind,
            RecommendationKind::IncreaseCacheSize { from: 600, to: 1000 }
        );
        assert!(recommendations[0].safe);
        assert_eq!(recommendations[1].kind, RecommendationKind::PreferUnitlessComparisons);
        assert!(!recommendations[1].safe);

        let capped = optimizer.generate_optimization_recommendations(
            &snapshot,
            &CacheMetrics::new(40, 160, 1000, 1000),
            1000,
        );
        assert!(capped.iter().all(|r| !r.safe));
    }

    /// Validates `apply_optimizations` against a live engine.
    ///
    /// Assertions:
    /// - Confirms a dry run proposes growth without resizing.
    /// - Confirms an auto-applied run grows the cache and records the change.
    #[test]
    fn test_apply_optimizations() {
        let clock = MockClock::new();
        let optimizer = ComparisonOptimizer::new(Arc::new(clock.clone()));
        let engine = engine(10);
        let day = ZonedInstant::utc(0);
        for offset in 0..150 {
            let other = ZonedInstant::utc(i128::from(offset) + 1);
            engine.is_before(&day, &other, Some(TimeUnit::Second)).unwrap();
        }

        let dry = optimizer.apply_optimizations(&engine, false);
        assert!(dry.applied.is_empty());
        assert!(dry.recommendations.iter().any(|r| r.safe));
        assert_eq!(engine.get_cache_stats().max_size, 10);

        let applied = optimizer.apply_optimizations(&engine, true);
        assert_eq!(
            applied.applied[0].kind,
            RecommendationKind::IncreaseCacheSize { from: 10, to: 20 }
        );
        assert_eq!(engine.get_cache_stats().max_size, 20);
        assert_eq!(applied.timestamp, clock.system_time());
        assert_eq!(optimizer.get_optimization_history().len(), 2);
    }

    /// Validates the bounded history.
    ///
    /// Assertions:
    /// - Confirms at most `HISTORY_LIMIT` records are kept.
    /// - Confirms `clear_history` empties it.
    #[test]
    fn test_history_limit() {
        let optimizer = ComparisonOptimizer::default();
        let engine = engine(100);
        for _ in 0..HISTORY_LIMIT + 5 {
            optimizer.apply_optimizations(&engine, true);
        }
        assert_eq!(optimizer.get_optimization_history().len(), HISTORY_LIMIT);

        optimizer.clear_history();
        assert!(optimizer.get_optimization_history().is_empty());
    }

    /// Validates the text report.
    ///
    /// Assertions:
    /// - Confirms the report names the operations and the recommendations.
    #[test]
    fn test_generate_report() {
        let optimizer = ComparisonOptimizer::default();
        let engine = engine(100);
        engine.is_after(&ZonedInstant::utc(2), &ZonedInstant::utc(1), None).unwrap();

        let report = optimizer.generate_report(&engine);

        assert!(report.starts_with("Comparison Engine Report"));
        assert!(report.contains(&format!("  {}: 1", ComparisonType::IsAfter)));
        assert!(report.contains("Recommendations"));
        assert!(report.contains("Total comparisons: 1"));
    }
}
