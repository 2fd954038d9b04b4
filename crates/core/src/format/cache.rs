//! Formatter cache, one resizable cache per formatter kind

use std::collections::BTreeMap;
use std::sync::Arc;

use atemporal_common::cache::{CacheMetrics, DetailedCacheMetrics, PerformanceRating};
use atemporal_common::CacheResult;
use tracing::debug;

use super::ports::{FormatterProvider, SharedFormatter};
use super::{FormatOptions, FormatValue, FormatterKind};
use crate::cache::{CacheEfficiency, CacheSettings, DomainCache, ManagedCache};
use crate::errors::FormatResult;

/// Cached formatter instances keyed by kind, locale and options
pub struct FormatterCache {
    provider: Arc<dyn FormatterProvider>,
    caches: [ManagedCache<String, SharedFormatter>; 4],
}

impl FormatterCache {
    /// Name reported to the coordinator
    pub const NAME: &'static str = "formatter";

    /// Create a formatter cache; every kind starts with `settings.max_size`
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// for invalid settings.
    pub fn new(settings: &CacheSettings, provider: Arc<dyn FormatterProvider>) -> CacheResult<Self> {
        let make = |kind: FormatterKind| ManagedCache::new(kind.cache_name(), settings.clone());
        Ok(Self {
            provider,
            caches: [
                make(FormatterKind::DateTime)?,
                make(FormatterKind::RelativeTime)?,
                make(FormatterKind::Number)?,
                make(FormatterKind::PluralRules)?,
            ],
        })
    }

    /// Cache holding formatters of `kind`
    pub fn cache(&self, kind: FormatterKind) -> &ManagedCache<String, SharedFormatter> {
        &self.caches[kind.index()]
    }

    /// Formatter for `kind`, `locale` and `options`, created on first use
    ///
    /// # Errors
    /// Propagates provider errors; failed creations are not cached.
    pub fn get_formatter(
        &self,
        kind: FormatterKind,
        locale: &str,
        options: &FormatOptions,
    ) -> FormatResult<SharedFormatter> {
        self.cache(kind)
            .get_or_compute(options.cache_key(locale), || self.provider.create(kind, locale, options))
    }

    /// Format `value` with a cached formatter
    ///
    /// # Errors
    /// Returns provider or formatter errors.
    pub fn format(
        &self,
        kind: FormatterKind,
        locale: &str,
        options: &FormatOptions,
        value: &FormatValue,
    ) -> FormatResult<String> {
        self.get_formatter(kind, locale, options)?.format(value)
    }

    /// Create the common formatters for each locale
    ///
    /// Returns the number of formatters created or already present.
    pub fn pre_warm(&self, locales: &[&str]) -> usize {
        let sets = common_option_sets();
        let mut warmed = 0;
        for locale in locales {
            for (kind, options) in &sets {
                if self.get_formatter(*kind, locale, options).is_ok() {
                    warmed += 1;
                }
            }
        }
        debug!(cache = Self::NAME, locales = locales.len(), warmed, "pre-warmed formatter cache");
        warmed
    }

    /// Usage snapshot per kind
    pub fn stats_by_kind(&self) -> BTreeMap<FormatterKind, CacheMetrics> {
        FormatterKind::ALL.iter().map(|kind| (*kind, self.cache(*kind).get_stats())).collect()
    }

    /// Set the capacity of every kind's cache
    ///
    /// Returns the total number of evicted entries.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`](atemporal_common::CacheError)
    /// when `max_size` is 0; no cache is changed.
    pub fn set_max_cache_size(&self, max_size: usize) -> CacheResult<usize> {
        let mut evicted = 0;
        for cache in &self.caches {
            evicted += cache.set_max_cache_size(max_size)?;
        }
        Ok(evicted)
    }

    /// Allow or forbid optimizer-driven resizes for every kind
    pub fn set_dynamic_sizing(&self, enabled: bool) {
        for cache in &self.caches {
            cache.set_dynamic_sizing(enabled);
        }
    }

    /// Whether every kind may be resized by the optimizer
    pub fn is_dynamic_sizing_enabled(&self) -> bool {
        self.caches.iter().all(ManagedCache::is_dynamic_sizing_enabled)
    }
}

impl DomainCache for FormatterCache {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn get_stats(&self) -> CacheMetrics {
        let stats: Vec<_> = self.caches.iter().map(ManagedCache::get_stats).collect();
        CacheMetrics::total(&stats)
    }

    fn get_detailed_stats(&self) -> DetailedCacheMetrics {
        let parts: Vec<_> = self.caches.iter().map(ManagedCache::get_detailed_stats).collect();
        let metrics = CacheMetrics::total(parts.iter().map(|part| &part.metrics));
        let optimizer = self.caches[0].optimizer();
        DetailedCacheMetrics {
            metrics,
            sets: parts.iter().map(|part| part.sets).sum(),
            evictions: parts.iter().map(|part| part.evictions).sum(),
            efficiency_score: optimizer.calculate_efficiency_score(&metrics),
            performance: PerformanceRating::from_hit_ratio(metrics.hit_ratio),
            dynamic_sizing: parts.iter().all(|part| part.dynamic_sizing),
            recommended_size: parts.iter().map(|part| part.recommended_size).sum(),
        }
    }

    fn get_efficiency_metrics(&self) -> CacheEfficiency {
        CacheEfficiency::evaluate(Self::NAME, self.caches[0].optimizer(), self.get_detailed_stats())
    }

    fn clear(&self) {
        for cache in &self.caches {
            cache.clear();
        }
    }

    fn optimize(&self) -> bool {
        self.caches.iter().fold(false, |resized, cache| cache.optimize() || resized)
    }

    fn reset(&self) {
        for cache in &self.caches {
            cache.reset();
        }
    }
}

impl std::fmt::Debug for FormatterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterCache").field("caches", &self.caches).finish_non_exhaustive()
    }
}

/// Option sets created by [`FormatterCache::pre_warm`]
fn common_option_sets() -> Vec<(FormatterKind, FormatOptions)> {
    vec![
        (FormatterKind::DateTime, FormatOptions::new()),
        (FormatterKind::DateTime, FormatOptions::new().with("dateStyle", "short")),
        (
            FormatterKind::DateTime,
            FormatOptions::new().with("dateStyle", "medium").with("timeStyle", "short"),
        ),
        (FormatterKind::DateTime, FormatOptions::new().with("timeStyle", "medium")),
        (FormatterKind::RelativeTime, FormatOptions::new().with("numeric", "always")),
        (FormatterKind::RelativeTime, FormatOptions::new().with("numeric", "auto")),
        (FormatterKind::Number, FormatOptions::new()),
        (FormatterKind::Number, FormatOptions::new().with("maximumFractionDigits", 2_i64)),
        (FormatterKind::PluralRules, FormatOptions::new().with("type", "cardinal")),
        (FormatterKind::PluralRules, FormatOptions::new().with("type", "ordinal")),
    ]
}
