//! Bounded least-recently-used cache
//!
//! Entries live in an arena of slots addressed by index. A doubly linked
//! recency list threads through the slots and a hash index maps each key to
//! its slot, so `get`, `set` and eviction are all O(1).
//!
//! ```text
//!   index: HashMap<K, usize>          slots: Vec<Option<Node>>
//!   ┌─────┬──────┐                    ┌──────┬──────────────────────────┐
//!   │ "a" │  0   │ ─────────────────► │  0   │ a=1 prev:None  next:2    │
//!   │ "c" │  2   │ ─────────────────► │  1   │ (free)                   │
//!   └─────┴──────┘                    │  2   │ c=3 prev:0     next:None │
//!                                     └──────┴──────────────────────────┘
//!   head (LRU) ─► [0] ◄──► [2] ◄── tail (MRU)
//! ```
//!
//! Freed slots are recycled through a free list before the arena grows.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

#[cfg(feature = "observability")]
use tracing::trace;

use super::stats::{CacheCounters, CacheMetrics};
use crate::error::{CacheError, CacheResult};

/// Upper bound on slots reserved up front, regardless of capacity
const PREALLOCATE_LIMIT: usize = 1024;

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity key-value store evicting the least recently used entry
///
/// `get` and `set` move the touched entry to the most-recently-used end;
/// `has` and `peek` leave recency and counters alone.
///
/// # Example
/// ```
/// use atemporal_common::cache::BoundedCache;
///
/// let mut cache = BoundedCache::new(2).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// assert_eq!(cache.get(&"a"), Some(&1));
///
/// // "b" is now the least recently used entry
/// let evicted = cache.set("c", 3);
/// assert_eq!(evicted, Some(("b", 2)));
/// assert!(!cache.has(&"b"));
/// ```
pub struct BoundedCache<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
    counters: CacheCounters,
}

pub(crate) fn validate_capacity(capacity: usize) -> CacheResult<()> {
    if capacity == 0 {
        return Err(CacheError::invalid_config("max_size", "cache size must be at least 1, got 0"));
    }
    Ok(())
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache holding at most `capacity` entries
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfiguration`] when `capacity` is 0.
    pub fn new(capacity: usize) -> CacheResult<Self> {
        validate_capacity(capacity)?;
        let reserve = capacity.min(PREALLOCATE_LIMIT);
        Ok(Self {
            slots: Vec::with_capacity(reserve),
            free: Vec::new(),
            index: HashMap::with_capacity(reserve),
            head: None,
            tail: None,
            capacity,
            counters: CacheCounters::default(),
        })
    }

    /// Look up `key`, recording a hit or miss
    ///
    /// A hit moves the entry to the most-recently-used position.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.touch(key)?;
        self.node(slot).map(|node| &node.value)
    }

    /// Mutable variant of [`get`](Self::get) with the same bookkeeping
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.touch(key)?;
        self.node_mut(slot).map(|node| &mut node.value)
    }

    /// Look up `key` without updating recency or counters
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.node(slot).map(|node| &node.value)
    }

    /// Insert or update `key`, making it the most recently used entry
    ///
    /// Returns the evicted least-recently-used entry when the insertion pushed
    /// the cache over capacity.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.counters.sets += 1;

        if let Some(&slot) = self.index.get(&key) {
            if let Some(node) = self.node_mut(slot) {
                node.value = value;
            }
            self.move_to_back(slot);
            return None;
        }

        let slot = self.allocate(Node { key: key.clone(), value, prev: None, next: None });
        self.index.insert(key, slot);
        self.attach_back(slot);

        if self.index.len() > self.capacity {
            self.evict_lru()
        } else {
            None
        }
    }

    /// Whether `key` is present; no recency change, no metric
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Remove `key`, returning its value
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.release(slot).map(|node| node.value)
    }

    /// Remove every entry and reset all counters
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
        self.counters = CacheCounters::default();
    }

    /// Remove and return the least recently used entry
    pub fn evict_lru(&mut self) -> Option<(K, V)> {
        let slot = self.head?;
        let node = self.release(slot)?;
        self.counters.evictions += 1;

        #[cfg(feature = "observability")]
        trace!(slot, len = self.index.len(), capacity = self.capacity, "evicted LRU entry");

        Some((node.key, node.value))
    }

    /// Change the capacity, evicting oldest entries until `len <= capacity`
    ///
    /// Returns the number of evicted entries.
    pub(crate) fn set_capacity(&mut self, capacity: usize) -> CacheResult<usize> {
        validate_capacity(capacity)?;
        self.capacity = capacity;
        let mut evicted = 0;
        while self.index.len() > capacity && self.evict_lru().is_some() {
            evicted += 1;
        }
        Ok(evicted)
    }

    fn touch<Q>(&mut self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&slot) = self.index.get(key) else {
            self.counters.misses += 1;
            return None;
        };
        self.counters.hits += 1;
        self.move_to_back(slot);
        Some(slot)
    }

    fn allocate(&mut self, node: Node<K, V>) -> usize {
        if let Some(slot) = self.free.pop() {
            if let Some(entry) = self.slots.get_mut(slot) {
                *entry = Some(node);
                return slot;
            }
        }
        self.slots.push(Some(node));
        self.slots.len() - 1
    }

    fn release(&mut self, slot: usize) -> Option<Node<K, V>> {
        self.detach(slot);
        let node = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.index.remove(&node.key);
        Some(node)
    }
}

impl<K, V> BoundedCache<K, V> {
    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Raw counters since construction or the last [`clear`](Self::clear)
    pub const fn counters(&self) -> CacheCounters {
        self.counters
    }

    /// Snapshot of hit ratio and utilization
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics::new(self.counters.hits, self.counters.misses, self.len(), self.capacity)
    }

    /// Entries from least to most recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { cache: self, current: self.head, remaining: self.len() }
    }

    /// Keys from least to most recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Values from least to most recently used
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Visit every entry from least to most recently used
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in self.iter() {
            f(key, value);
        }
    }

    fn node(&self, slot: usize) -> Option<&Node<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn detach(&mut self, slot: usize) {
        let Some((prev, next)) = self.node(slot).map(|node| (node.prev, node.next)) else {
            return;
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(node) => node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(node) => node.prev = prev,
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(slot) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail.and_then(|t| self.node_mut(t)) {
            Some(node) => node.next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    fn move_to_back(&mut self, slot: usize) {
        if self.tail != Some(slot) {
            self.detach(slot);
            self.attach_back(slot);
        }
    }

    /// Panics if the recency list, index and free list disagree
    #[cfg(test)]
    pub(crate) fn debug_validate_invariants(&self)
    where
        K: Eq + Hash,
    {
        let mut count = 0;
        let mut prev = None;
        let mut current = self.head;
        while let Some(slot) = current {
            let node = self.node(slot).expect("linked slot is occupied");
            assert_eq!(node.prev, prev, "prev link mismatch at slot {slot}");
            assert_eq!(self.index.get(&node.key), Some(&slot), "index mismatch at slot {slot}");
            prev = Some(slot);
            current = node.next;
            count += 1;
        }
        assert_eq!(self.tail, prev);
        assert_eq!(count, self.index.len());
        assert_eq!(self.slots.len(), self.index.len() + self.free.len());
        assert!(self.index.len() <= self.capacity);
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

/// Iterator over cache entries, oldest first
pub struct Iter<'a, K, V> {
    cache: &'a BoundedCache<K, V>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cache.node(self.current?)?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a BoundedCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::lru.
    use proptest::prelude::*;

    use super::*;

    /// Validates the two-slot eviction scenario.
    ///
    /// Assertions:
    /// - Ensures `has("a")` is false after inserting a third key.
    /// - Ensures `has("b")` and `has("c")` remain true.
    #[test]
    fn test_capacity_two_evicts_oldest() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        let evicted = cache.set("c", 3);

        assert_eq!(evicted, Some(("a", 1)));
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
        assert_eq!(cache.counters().evictions, 1);
    }

    /// Validates that `get` refreshes recency before an eviction.
    ///
    /// Assertions:
    /// - Confirms the refreshed key survives and the untouched key is
    ///   evicted.
    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set(1, "one");
        cache.set(2, "two");
        cache.set(3, "three");

        assert_eq!(cache.get(&1), Some(&"one"));
        cache.set(4, "four");

        assert!(cache.has(&1));
        assert!(!cache.has(&2));
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![3, 1, 4]);
    }

    /// Validates that `has` and `peek` do not change recency or metrics.
    ///
    /// Assertions:
    /// - Confirms hit/miss counters stay at zero.
    /// - Confirms the peeked key is still evicted first.
    #[test]
    fn test_has_and_peek_are_passive() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.has("a"));
        assert_eq!(cache.peek("a"), Some(&1));
        assert!(!cache.has("zzz"));
        assert_eq!(cache.metrics().hits, 0);
        assert_eq!(cache.metrics().misses, 0);

        cache.set("c", 3);
        assert!(!cache.has("a"));
    }

    /// Validates updating an existing key.
    ///
    /// Assertions:
    /// - Confirms the value is replaced without growing the cache.
    /// - Confirms the updated key becomes most recently used.
    #[test]
    fn test_set_existing_updates_and_refreshes() {
        let mut cache = BoundedCache::new(2).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.set("a", 10), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.values().copied().collect::<Vec<_>>(), vec![2, 10]);
        assert_eq!(cache.counters().sets, 3);
    }

    /// Validates hit/miss accounting and `clear`.
    ///
    /// Assertions:
    /// - Confirms hit ratio after one hit and one miss.
    /// - Ensures `clear` empties the cache and resets counters.
    #[test]
    fn test_metrics_and_clear() {
        let mut cache = BoundedCache::new(4).unwrap();
        cache.set("k", 7);
        assert_eq!(cache.get("k"), Some(&7));
        assert_eq!(cache.get("missing"), None);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert!((metrics.hit_ratio - 0.5).abs() < f64::EPSILON);
        assert!((metrics.utilization - 0.25).abs() < f64::EPSILON);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.metrics(), CacheMetrics::new(0, 0, 0, 4));
        assert_eq!(cache.counters(), CacheCounters::default());
    }

    /// Validates `delete` and slot reuse.
    ///
    /// Assertions:
    /// - Confirms the deleted value is returned.
    /// - Ensures the freed slot is reused without growing the arena.
    #[test]
    fn test_delete_reuses_slot() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);

        assert_eq!(cache.delete("a"), Some(1));
        assert_eq!(cache.delete("a"), None);
        cache.set("c", 3);

        assert_eq!(cache.slots.len(), 2);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["b", "c"]);
        cache.debug_validate_invariants();
    }

    /// Validates `get_mut` and ordered iteration helpers.
    ///
    /// Assertions:
    /// - Confirms in-place mutation is visible through `peek`.
    /// - Confirms `for_each` visits entries oldest first.
    #[test]
    fn test_get_mut_and_for_each() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set("x", 1);
        cache.set("y", 2);
        if let Some(value) = cache.get_mut("x") {
            *value += 40;
        }

        let mut seen = Vec::new();
        cache.for_each(|key, value| seen.push((*key, *value)));
        assert_eq!(seen, vec![("y", 2), ("x", 41)]);
        assert_eq!(cache.iter().len(), 2);
    }

    /// Validates capacity validation and shrinking.
    ///
    /// Assertions:
    /// - Ensures a zero capacity is rejected with `InvalidConfiguration`.
    /// - Confirms shrinking evicts the oldest entries first.
    #[test]
    fn test_capacity_validation_and_shrink() {
        let err = BoundedCache::<u8, u8>::new(0).unwrap_err();
        assert_eq!(err.parameter(), "max_size");

        let mut cache = BoundedCache::new(5).unwrap();
        for i in 0..5 {
            cache.set(i, i);
        }
        assert_eq!(cache.set_capacity(2).unwrap(), 3);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert!(cache.set_capacity(0).is_err());
        assert_eq!(cache.capacity(), 2);
        cache.debug_validate_invariants();
    }

    #[derive(Debug, Clone)]
    enum Operation {
        Set(u32, u32),
        Get(u32),
        Delete(u32),
    }

    fn operation_strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            (0u32..50, 0u32..100).prop_map(|(k, v)| Operation::Set(k, v)),
            (0u32..50).prop_map(Operation::Get),
            (0u32..50).prop_map(Operation::Delete),
        ]
    }

    proptest! {
        /// len() never exceeds capacity after any sequence of sets.
        #[test]
        fn prop_len_within_capacity(
            capacity in 1usize..64,
            ops in prop::collection::vec((0u32..1000, 0u32..100), 0..200)
        ) {
            let mut cache = BoundedCache::new(capacity).unwrap();
            for (key, value) in ops {
                cache.set(key, value);
                prop_assert!(cache.len() <= cache.capacity());
            }
        }

        /// Arbitrary operation sequences keep the arena consistent and agree
        /// with a simple recency-ordered model.
        #[test]
        fn prop_matches_reference_model(
            capacity in 1usize..20,
            ops in prop::collection::vec(operation_strategy(), 0..200)
        ) {
            let mut cache = BoundedCache::new(capacity).unwrap();
            let mut model: Vec<(u32, u32)> = Vec::new();

            for op in ops {
                match op {
                    Operation::Set(k, v) => {
                        model.retain(|(key, _)| *key != k);
                        model.push((k, v));
                        if model.len() > capacity {
                            model.remove(0);
                        }
                        cache.set(k, v);
                    }
                    Operation::Get(k) => {
                        let expected = model.iter().position(|(key, _)| *key == k).map(|pos| {
                            let entry = model.remove(pos);
                            model.push(entry);
                            entry.1
                        });
                        prop_assert_eq!(cache.get(&k).copied(), expected);
                    }
                    Operation::Delete(k) => {
                        let expected = model.iter().position(|(key, _)| *key == k)
                            .map(|pos| model.remove(pos).1);
                        prop_assert_eq!(cache.delete(&k), expected);
                    }
                }
                cache.debug_validate_invariants();
                let actual: Vec<(u32, u32)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(&actual, &model);
            }
        }
    }
}
