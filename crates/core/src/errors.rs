//! Error types for the caching and comparison layer

use std::time::Duration;

use atemporal_common::{CacheError, ErrorClassification, ErrorSeverity};
use atemporal_domain::{DomainError, TimeUnit};
use thiserror::Error;

use crate::comparison::ComparisonType;
use crate::format::FormatterKind;

/// Errors raised by the comparison engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparisonError {
    /// No registered strategy handles the requested comparison
    #[error("Unsupported comparison: no strategy handles {comparison}{}", unit_suffix(.unit))]
    UnsupportedComparison { comparison: ComparisonType, unit: Option<TimeUnit> },

    /// `is_between` inclusivity is not one of `()`, `[]`, `[)`, `(]`
    #[error("Invalid inclusivity '{0}': expected one of (), [], [), (]")]
    InvalidInclusivity(String),

    /// Calendar computation failed
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Cache configuration was rejected
    #[error(transparent)]
    Cache(#[from] CacheError),
}

fn unit_suffix(unit: &Option<TimeUnit>) -> String {
    unit.map(|unit| format!(" with unit {unit}")).unwrap_or_default()
}

/// Errors raised while creating or formatting with formatters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The formatter cannot render this kind of value
    #[error("{kind} formatter cannot format {value}")]
    UnsupportedValue { kind: FormatterKind, value: &'static str },

    /// A formatting option has an invalid value
    #[error("Invalid format option {name}={value}")]
    InvalidOption { name: String, value: String },

    /// Calendar computation failed
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Errors raised by registry configuration and cache construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// Configuration text could not be parsed or serialized
    #[error("Failed to parse registry configuration: {0}")]
    Parse(String),

    /// Configuration values are invalid
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result alias for comparison operations
pub type Result<T, E = ComparisonError> = std::result::Result<T, E>;
/// Result alias for formatter operations
pub type FormatResult<T> = Result<T, FormatError>;
/// Result alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

impl ErrorClassification for ComparisonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            // A missing strategy is a wiring mistake, not bad data
            Self::UnsupportedComparison { .. } => ErrorSeverity::Critical,
            Self::InvalidInclusivity(_) | Self::Domain(_) => ErrorSeverity::Warning,
            Self::Cache(err) => err.severity(),
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::UnsupportedComparison { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl ErrorClassification for FormatError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl ErrorClassification for RegistryError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
