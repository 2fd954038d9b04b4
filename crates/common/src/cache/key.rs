//! Structured cache keys
//!
//! [`KeyBuilder`] concatenates typed fragments into a string key. Each
//! fragment carries a type tag and string fragments carry their length, so
//! two different fragment sequences never produce the same key:
//!
//! | Fragment | Encoding |
//! |----------|----------|
//! | string | `s<len>:<text>` |
//! | signed integer | `i<value>;` |
//! | unsigned integer | `u<value>;` |
//! | float | `f<bits as hex>;` |
//! | boolean | `b1` / `b0` |
//! | absent | `n` |
//! | map | `m<count>{` sorted `key value` pairs `}` |
//!
//! Maps are flattened with their keys sorted, so insertion order of option
//! objects does not affect the key.

use std::fmt::Write as _;

/// A single typed value inside a structured key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyPart<'a> {
    /// Text fragment
    Str(&'a str),
    /// Signed integer fragment
    Int(i64),
    /// Unsigned integer fragment
    UInt(u64),
    /// Floating point fragment, encoded by bit pattern
    Float(f64),
    /// Boolean fragment
    Bool(bool),
    /// Explicitly absent value
    None,
}

impl<'a> From<&'a str> for KeyPart<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for KeyPart<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for KeyPart<'_> {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for KeyPart<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for KeyPart<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<'a, T> From<Option<T>> for KeyPart<'a>
where
    T: Into<KeyPart<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

/// Incremental builder for structured string keys
///
/// # Example
/// ```
/// use atemporal_common::cache::{KeyBuilder, KeyPart};
///
/// let a = KeyBuilder::new()
///     .str("en-US")
///     .map([("year", KeyPart::Str("numeric")), ("hour12", KeyPart::Bool(true))])
///     .build();
/// let b = KeyBuilder::new()
///     .str("en-US")
///     .map([("hour12", KeyPart::Bool(true)), ("year", KeyPart::Str("numeric"))])
///     .build();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBuilder {
    buf: String,
    fragments: usize,
}

impl KeyBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty builder with reserved space
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: String::with_capacity(capacity), fragments: 0 }
    }

    /// Append a string fragment
    #[must_use]
    pub fn str(mut self, value: &str) -> Self {
        self.push(KeyPart::Str(value));
        self
    }

    /// Append a signed integer fragment
    #[must_use]
    pub fn int(mut self, value: i64) -> Self {
        self.push(KeyPart::Int(value));
        self
    }

    /// Append an unsigned integer fragment
    #[must_use]
    pub fn uint(mut self, value: u64) -> Self {
        self.push(KeyPart::UInt(value));
        self
    }

    /// Append a floating point fragment
    #[must_use]
    pub fn float(mut self, value: f64) -> Self {
        self.push(KeyPart::Float(value));
        self
    }

    /// Append a boolean fragment
    #[must_use]
    pub fn bool(mut self, value: bool) -> Self {
        self.push(KeyPart::Bool(value));
        self
    }

    /// Append any fragment
    #[must_use]
    pub fn part<'a>(mut self, value: impl Into<KeyPart<'a>>) -> Self {
        self.push(value.into());
        self
    }

    /// Append a map, flattened in key order
    #[must_use]
    pub fn map<'a, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, KeyPart<'a>)>,
    {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let _ = write!(self.buf, "m{}{{", entries.len());
        for (key, value) in entries {
            self.encode(KeyPart::Str(key));
            self.encode(value);
        }
        self.buf.push('}');
        self.fragments += 1;
        self
    }

    /// Number of top-level fragments appended
    pub const fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Finish and return the key
    pub fn build(self) -> String {
        self.buf
    }

    fn push(&mut self, part: KeyPart<'_>) {
        self.encode(part);
        self.fragments += 1;
    }

    fn encode(&mut self, part: KeyPart<'_>) {
        // Writing into a String cannot fail
        let _ = match part {
            KeyPart::Str(value) => write!(self.buf, "s{}:{value}", value.len()),
            KeyPart::Int(value) => write!(self.buf, "i{value};"),
            KeyPart::UInt(value) => write!(self.buf, "u{value};"),
            KeyPart::Float(value) => write!(self.buf, "f{:x};", value.to_bits()),
            KeyPart::Bool(value) => write!(self.buf, "b{}", u8::from(value)),
            KeyPart::None => write!(self.buf, "n"),
        };
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::key.
    use super::*;

    /// Validates fragment encoding.
    ///
    /// Assertions:
    /// - Confirms the exact key for one fragment of each type.
    /// - Confirms the fragment count.
    #[test]
    fn test_fragment_encoding() {
        let builder = KeyBuilder::new()
            .str("ab")
            .int(-3)
            .uint(7)
            .float(1.0)
            .bool(true)
            .part(None::<&str>);
        assert_eq!(builder.fragment_count(), 6);
        assert_eq!(builder.build(), "s2:abi-3;u7;f3ff0000000000000;b1n");
    }

    /// Validates that length prefixes prevent ambiguous concatenation.
    ///
    /// Assertions:
    /// - Ensures `["ab", "c"]` and `["a", "bc"]` produce different keys.
    /// - Ensures a string and an integer with the same text differ.
    #[test]
    fn test_keys_are_unambiguous() {
        let left = KeyBuilder::new().str("ab").str("c").build();
        let right = KeyBuilder::new().str("a").str("bc").build();
        assert_ne!(left, right);

        assert_ne!(KeyBuilder::new().str("1").build(), KeyBuilder::new().int(1).build());
    }

    /// Validates map flattening.
    ///
    /// Assertions:
    /// - Confirms key order does not matter.
    /// - Ensures differing values change the key.
    #[test]
    fn test_map_sorted() {
        let a = KeyBuilder::new().map([("b", KeyPart::Int(1)), ("a", KeyPart::None)]).build();
        let b = KeyBuilder::new().map([("a", KeyPart::None), ("b", KeyPart::Int(1))]).build();
        let c = KeyBuilder::new().map([("a", KeyPart::None), ("b", KeyPart::Int(2))]).build();

        assert_eq!(a, "m2{s1:ans1:bi1;}");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
