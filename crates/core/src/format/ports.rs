//! Formatter ports
//!
//! Locale-aware text generation lives outside this crate. These traits are
//! the seam: a provider builds formatters, the cache keeps them.

use std::fmt;
use std::sync::Arc;

use super::{FormatOptions, FormatValue, FormatterKind};
use crate::errors::FormatResult;

/// A configured formatter for one kind, locale and option set
pub trait Formatter: Send + Sync + fmt::Debug {
    /// Kind of values this formatter renders
    fn kind(&self) -> FormatterKind;

    /// Locale the formatter was created for
    fn locale(&self) -> &str;

    /// Render `value`
    fn format(&self, value: &FormatValue) -> FormatResult<String>;
}

/// Formatter handle stored in the cache
pub type SharedFormatter = Arc<dyn Formatter>;

/// Factory for formatters
pub trait FormatterProvider: Send + Sync {
    /// Build a formatter of `kind` for `locale` and `options`
    fn create(
        &self,
        kind: FormatterKind,
        locale: &str,
        options: &FormatOptions,
    ) -> FormatResult<SharedFormatter>;
}
