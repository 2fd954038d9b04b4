//! Comparison engine
//!
//! [`ComparisonEngine`] answers ordering predicates, unit differences and
//! balanced durations between [`ZonedInstant`](atemporal_domain::ZonedInstant)s.
//! Each request is dispatched to the highest priority
//! [`ComparisonStrategy`] that accepts it, and results are memoized in a
//! [`ComparisonCache`]. [`ComparisonOptimizer`] scores the engine's metrics
//! and proposes or applies tuning.

mod cache;
mod engine;
mod optimizer;
mod strategy;
mod types;

pub use cache::ComparisonCache;
pub use engine::ComparisonEngine;
pub use optimizer::{
    ComparisonOptimizer, EfficiencyBreakdown, EngineAnalysis, OptimizationRecommendation,
    OptimizationRecord, RecommendationKind, RecommendationPriority, HISTORY_LIMIT,
};
pub use strategy::{
    ComparisonStrategy, DEFAULT_DIFF_UNIT, DEFAULT_LARGEST_UNIT, DEFAULT_SMALLEST_UNIT,
};
pub use types::{
    ComparisonCacheEntry, ComparisonContext, ComparisonKey, ComparisonMetrics, ComparisonOptions,
    ComparisonResult, ComparisonType, ComparisonValue, Inclusivity, Precision,
};
