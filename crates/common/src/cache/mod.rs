//! Adaptive bounded caches
//!
//! This module provides the caching primitives the domain caches are built
//! from:
//!
//! - [`BoundedCache`]: fixed-capacity LRU store with hit/miss accounting
//! - [`ResizableCache`]: a bounded cache whose capacity can change at runtime,
//!   gated by a clock so resizes cannot thrash
//! - [`CacheOptimizer`]: heuristics turning [`CacheMetrics`] into resize
//!   decisions, efficiency scores and recommendations
//! - [`KeyBuilder`]: structured, unambiguous string keys
//!
//! # Example
//!
//! ```
//! use atemporal_common::cache::{CacheOptimizer, ResizableCache};
//!
//! let optimizer = CacheOptimizer::default();
//! let mut cache: ResizableCache<String, u64> = ResizableCache::new(50).unwrap();
//!
//! for i in 0..200u64 {
//!     let key = format!("k{}", i % 80);
//!     if cache.get(&key).is_none() {
//!         cache.set(key, i);
//!     }
//! }
//!
//! let metrics = cache.metrics();
//! let optimal = optimizer.calculate_optimal_size(&metrics, cache.max_size());
//! assert!(optimal >= cache.max_size());
//! ```
//!
//! # Thread Safety
//!
//! The caches take `&mut self` for every recency-changing operation. Shared
//! use goes through a single lock per cache (see the domain caches in
//! `atemporal-core`), which also makes a resize atomic with respect to
//! concurrent lookups.

mod config;
mod key;
mod lru;
mod optimizer;
mod resizable;
mod stats;
pub mod utils;

// Re-export public API
pub use config::{
    ResizableCacheConfig, ResizableCacheConfigBuilder, RuntimeProfile, DEFAULT_MAX_SIZE,
    DEFAULT_RESIZE_INTERVAL, MIN_PRODUCTION_RESIZE_INTERVAL,
};
pub use key::{KeyBuilder, KeyPart};
pub use lru::{BoundedCache, Iter};
pub use optimizer::{
    CacheOptimizer, CacheOptimizerConfig, CacheOptimizerConfigBuilder, OptimizationInsights,
    PerformanceAnalysis, PerformanceRating,
};
pub use resizable::ResizableCache;
pub use stats::{CacheCounters, CacheMetrics, DetailedCacheMetrics};
