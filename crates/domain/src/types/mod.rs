//! Time domain types
//!
//! - [`unit`]: time units and rounding modes
//! - [`instant`]: zoned, nanosecond-resolution instants
//! - [`duration`]: balanced calendar durations

pub mod duration;
pub mod instant;
pub mod unit;

pub use duration::CalendarDuration;
pub use instant::ZonedInstant;
pub use unit::{RoundingMode, TimeUnit};
