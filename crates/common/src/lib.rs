//! Cache primitives and shared utilities for the atemporal crates.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards to ensure
//! reliability across all atemporal components.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, clocks, bounded/resizable caches, optimizer
//! - `observability`: tracing events for resize and eviction decisions
//! - `runtime`: foundation + observability (default)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod cache;
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use cache::{
    BoundedCache, CacheMetrics, CacheOptimizer, CacheOptimizerConfig, DetailedCacheMetrics,
    KeyBuilder, ResizableCache, RuntimeProfile,
};
#[cfg(feature = "foundation")]
pub use error::{CacheError, CacheResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};
