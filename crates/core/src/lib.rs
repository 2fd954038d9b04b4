//! # Atemporal Core
//!
//! Adaptive caches and the comparison engine for zoned instants.
//!
//! This crate contains:
//! - Domain caches: formatter instances, unit differences and comparison
//!   results, each built on a self-optimizing [`cache::ManagedCache`]
//! - [`ComparisonEngine`]: strategy dispatch for ordering predicates, diffs
//!   and durations, with result caching and metrics
//! - [`ComparisonOptimizer`]: engine health analysis and tuning
//! - [`CacheRegistry`] and [`GlobalCacheCoordinator`]: lazy ownership of
//!   every cache and an aggregated view over them
//!
//! ## Architecture Principles
//! - Depends on `atemporal-common` for cache primitives and
//!   `atemporal-domain` for instants
//! - Formatter creation goes through the [`FormatterProvider`] port
//! - No I/O; every structure is in-memory and `Send + Sync`

pub mod cache;
pub mod comparison;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod format;
pub mod registry;

// Re-export specific items to avoid ambiguity
pub use cache::{CacheSettings, DiffCache, DomainCache, ManagedCache};
pub use comparison::{
    ComparisonCache, ComparisonContext, ComparisonEngine, ComparisonOptimizer, ComparisonOptions,
    ComparisonResult, ComparisonStrategy, ComparisonType, Inclusivity,
};
pub use config::RegistryConfig;
pub use coordinator::{AllCacheStats, GlobalCacheCoordinator};
pub use errors::{ComparisonError, FormatError, RegistryError, RegistryResult};
pub use format::{FormatterCache, FormatterKind, FormatterProvider, PatternFormatterProvider};
pub use registry::CacheRegistry;
