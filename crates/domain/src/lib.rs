//! # Atemporal Domain
//!
//! Time domain types shared by the atemporal crates.
//!
//! This crate contains:
//! - [`ZonedInstant`]: a nanosecond-resolution, totally ordered instant bound
//!   to an IANA timezone
//! - [`TimeUnit`] and [`RoundingMode`] used by truncation, addition and
//!   difference operations
//! - [`CalendarDuration`]: a balanced, signed duration
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other atemporal crates
//! - Only external dependencies allowed
//! - Calendar and offset rules come from `chrono` / `chrono-tz`

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
