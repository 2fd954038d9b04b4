//! Error types and classification shared by the atemporal crates
//!
//! The caching subsystem has a deliberately small error surface:
//!
//! - [`CacheError::InvalidConfiguration`] is returned synchronously for an
//!   invalid cache size, resize interval or optimizer setting. Values are
//!   never silently clamped.
//! - A missing entry is a cache miss, not an error.
//!
//! Every error type in the workspace implements [`ErrorClassification`] so
//! call sites can make uniform logging and retry decisions.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case |
//! |-------|----------|
//! | **Info** | Informational, expected conditions |
//! | **Warning** | Degraded but operational |
//! | **Error** | Failure requiring attention (invalid configuration) |
//! | **Critical** | Programming errors, broken invariants |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by cache construction and configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A configuration value is outside its allowed range
    #[error("Invalid configuration for {parameter}: {message}")]
    InvalidConfiguration { parameter: &'static str, message: String },
}

impl CacheError {
    /// Create an invalid configuration error for `parameter`
    pub fn invalid_config(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration { parameter, message: message.into() }
    }

    /// Name of the offending configuration parameter
    pub const fn parameter(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { parameter, .. } => parameter,
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Nothing in the caching subsystem is transient; errors here describe
    /// bad input or programming mistakes.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorClassification for CacheError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidConfiguration { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
