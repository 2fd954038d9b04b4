//! Error types used by the time domain

use thiserror::Error;

use crate::types::TimeUnit;

/// Main error type for time domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown time unit: {0}")]
    UnknownUnit(String),

    #[error("Instant out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid unit range: smallest unit {smallest} exceeds largest unit {largest}")]
    InvalidUnitRange { smallest: TimeUnit, largest: TimeUnit },
}

/// Result type alias for time domain operations
pub type Result<T> = std::result::Result<T, DomainError>;
