//! Domain caches built on the common cache primitives
//!
//! - [`ManagedCache`]: lock-protected resizable cache wired to an optimizer
//! - [`DiffCache`]: memoized unit differences
//! - [`DomainCache`]: the operations the coordinator runs on every cache
//!
//! The formatter and comparison caches live next to their consumers in
//! [`crate::format`] and [`crate::comparison`].

mod diff;
mod managed;

pub use diff::{DiffCache, DiffKey};
pub use managed::{CacheEfficiency, CacheSettings, DomainCache, ManagedCache, SharedClock};
