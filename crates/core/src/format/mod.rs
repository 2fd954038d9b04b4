//! Formatter instances and their cache
//!
//! Formatter construction is the expensive part of formatting, so
//! [`FormatterCache`] keeps one instance per formatter kind, locale and
//! option set. Instances come from a [`FormatterProvider`];
//! [`PatternFormatterProvider`] is the built-in provider on top of chrono's
//! strftime patterns.

mod cache;
mod pattern;
pub mod ports;

use std::collections::BTreeMap;
use std::fmt;

use atemporal_common::cache::{KeyBuilder, KeyPart};
use atemporal_domain::{TimeUnit, ZonedInstant};
use serde::{Deserialize, Serialize};

pub use cache::FormatterCache;
pub use pattern::PatternFormatterProvider;
pub use ports::{Formatter, FormatterProvider, SharedFormatter};

/// Family of formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatterKind {
    DateTime,
    RelativeTime,
    Number,
    PluralRules,
}

impl FormatterKind {
    /// Every kind
    pub const ALL: [Self; 4] = [Self::DateTime, Self::RelativeTime, Self::Number, Self::PluralRules];

    /// Canonical snake case name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateTime => "date_time",
            Self::RelativeTime => "relative_time",
            Self::Number => "number",
            Self::PluralRules => "plural_rules",
        }
    }

    /// Name of the cache holding formatters of this kind
    pub const fn cache_name(self) -> &'static str {
        match self {
            Self::DateTime => "formatter.date_time",
            Self::RelativeTime => "formatter.relative_time",
            Self::Number => "formatter.number",
            Self::PluralRules => "formatter.plural_rules",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::DateTime => 0,
            Self::RelativeTime => 1,
            Self::Number => 2,
            Self::PluralRules => 3,
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single formatting option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl OptionValue {
    fn key_part(&self) -> KeyPart<'_> {
        match self {
            Self::Bool(value) => KeyPart::Bool(*value),
            Self::Int(value) => KeyPart::Int(*value),
            Self::Float(value) => KeyPart::Float(*value),
            Self::Str(value) => KeyPart::Str(value),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Named formatting options
///
/// Options are kept sorted by name, so the cache key does not depend on the
/// order they were set in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl FormatOptions {
    /// No options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an option, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Value of `name`
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    /// String value of `name`, if set to a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(OptionValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Boolean value of `name`, if set to a boolean
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.entries.get(name) {
            Some(OptionValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// Integer value of `name`, if set to an integer
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.entries.get(name) {
            Some(OptionValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no option is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Structured cache key for `locale` and these options
    pub fn cache_key(&self, locale: &str) -> String {
        KeyBuilder::with_capacity(16 + self.entries.len() * 24)
            .str(locale)
            .map(self.iter().map(|(name, value)| (name, value.key_part())))
            .build()
    }
}

/// Something a formatter can render
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatValue {
    /// A point in time
    Instant(ZonedInstant),
    /// A plain number
    Number(f64),
    /// A signed amount of a unit relative to now
    Relative { value: i64, unit: TimeUnit },
}

impl FormatValue {
    /// Short description used in errors
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Instant(_) => "instant",
            Self::Number(_) => "number",
            Self::Relative { .. } => "relative time",
        }
    }
}
