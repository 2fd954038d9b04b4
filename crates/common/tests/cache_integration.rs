//! Integration tests for cache module
//!
//! Exercises the bounded cache, the resize gate and the optimizer together,
//! plus shared access through a mutex.

#![cfg(feature = "foundation")]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use atemporal_common::cache::utils::{CacheHealth, CacheHealthReport};
use atemporal_common::cache::{
    BoundedCache, CacheMetrics, CacheOptimizer, DetailedCacheMetrics, ResizableCache,
    ResizableCacheConfig, RuntimeProfile,
};
use atemporal_common::time::MockClock;
use atemporal_common::{CacheError, ErrorClassification, ErrorSeverity};
use parking_lot::Mutex;

fn testing_cache(max_size: usize, clock: &MockClock) -> ResizableCache<String, u64, MockClock> {
    let config = ResizableCacheConfig::builder()
        .max_size(max_size)
        .resize_interval(Duration::from_millis(250))
        .profile(RuntimeProfile::Testing)
        .build()
        .unwrap();
    ResizableCache::with_config(config, clock.clone()).unwrap()
}

/// Verifies LRU eviction after an explicit recency refresh.
///
/// Inserting C+1 distinct keys must evict exactly the least recently accessed
/// key, where a `get` counts as an access.
///
/// # Test Steps
/// 1. Insert 3 items into a cache with capacity 3
/// 2. Access key1 to mark it as recently used
/// 3. Insert a 4th item, triggering eviction of key2
/// 4. Verify key1, key3 and key4 remain
#[test]
fn test_lru_eviction_respects_recency() {
    let mut cache: BoundedCache<String, i32> = BoundedCache::new(3).unwrap();

    cache.set("key1".to_string(), 100);
    cache.set("key2".to_string(), 200);
    cache.set("key3".to_string(), 300);

    assert_eq!(cache.get("key1"), Some(&100));

    let evicted = cache.set("key4".to_string(), 400);
    assert_eq!(evicted, Some(("key2".to_string(), 200)));

    assert!(cache.has("key1"));
    assert!(!cache.has("key2"));
    assert!(cache.has("key3"));
    assert!(cache.has("key4"));
    assert_eq!(cache.len(), 3);
}

/// Verifies the optimizer-driven resize loop on a resizable cache.
///
/// # Test Steps
/// 1. Thrash a 20 entry cache with 40 rotating keys to drive hits down
/// 2. Confirm the gate is closed until the interval passes
/// 3. Apply the optimal size and mark the resize
/// 4. Verify the cache grew by the growth factor and the gate closed again
#[test]
fn test_optimizer_resize_cycle() {
    let clock = MockClock::new();
    let optimizer = CacheOptimizer::for_profile(RuntimeProfile::Testing);
    let mut cache = testing_cache(20, &clock);

    for i in 0..120u64 {
        let key = format!("k{}", i % 40);
        if cache.get(&key).is_none() {
            cache.set(key, i);
        }
    }

    let metrics = cache.metrics();
    assert!(optimizer.should_resize(&metrics));
    assert!(!cache.should_resize());

    clock.advance(Duration::from_millis(250));
    assert!(cache.should_resize());

    let optimal = optimizer.calculate_optimal_size(&metrics, cache.max_size());
    assert_eq!(optimal, 30);
    cache.set_max_size(optimal).unwrap();
    cache.mark_resized();

    assert_eq!(cache.max_size(), 30);
    assert_eq!(cache.len(), 20);
    assert!(!cache.should_resize());
}

/// Verifies that shrinking below the live entry count evicts the oldest
/// entries and keeps the rest in recency order.
///
/// # Test Steps
/// 1. Fill a cache with 10 entries
/// 2. Shrink to 4
/// 3. Verify the 4 most recent keys survive
#[test]
fn test_shrink_keeps_most_recent() {
    let clock = MockClock::new();
    let mut cache = testing_cache(10, &clock);
    for i in 0..10u64 {
        cache.set(format!("k{i}"), i);
    }

    assert_eq!(cache.set_max_size(4).unwrap(), 6);
    let keys: Vec<&String> = cache.keys().collect();
    assert_eq!(keys, ["k6", "k7", "k8", "k9"]);
    assert_eq!(cache.metrics().utilization, 1.0);
}

/// Verifies configuration errors are explicit and classified.
///
/// # Test Steps
/// 1. Request a zero capacity and a sub-second production interval
/// 2. Verify both fail with `InvalidConfiguration`
/// 3. Verify classification marks them as non-retryable errors
#[test]
fn test_configuration_errors() {
    let zero = BoundedCache::<u8, u8>::new(0).unwrap_err();
    assert!(matches!(zero, CacheError::InvalidConfiguration { parameter: "max_size", .. }));

    let mut cache: ResizableCache<u8, u8> = ResizableCache::new(5).unwrap();
    let interval = cache.set_resize_interval(Duration::from_millis(10)).unwrap_err();
    assert_eq!(interval.parameter(), "resize_interval");
    assert!(!interval.is_retryable());
    assert_eq!(interval.severity(), ErrorSeverity::Error);
}

/// Verifies concurrent access through one mutex per cache.
///
/// # Test Steps
/// 1. Share a cache behind `Arc<Mutex<_>>` across 8 threads
/// 2. Each thread inserts and reads back its own keys
/// 3. Verify the capacity bound and that every lookup was counted
#[test]
fn test_concurrent_access() {
    let cache = Arc::new(Mutex::new(BoundedCache::<String, usize>::new(64).unwrap()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{t}-{i}");
                    let mut guard = cache.lock();
                    guard.set(key.clone(), i);
                    assert_eq!(guard.get(&key), Some(&i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let guard = cache.lock();
    assert_eq!(guard.len(), 64);
    assert_eq!(guard.metrics().hits, 400);
    assert_eq!(guard.counters().evictions, 400 - 64);
}

/// Verifies the health report end to end from live cache counters.
///
/// # Test Steps
/// 1. Drive a small cache to full with a poor hit ratio
/// 2. Build a detailed snapshot with the optimizer's view
/// 3. Verify the report flags it as critical
#[test]
fn test_health_report_from_cache() {
    let optimizer = CacheOptimizer::default();
    let mut cache: BoundedCache<u64, u64> = BoundedCache::new(10).unwrap();
    for i in 0..200 {
        if cache.get(&(i % 30)).is_none() {
            cache.set(i % 30, i);
        }
    }

    let metrics = cache.metrics();
    let counters = cache.counters();
    let stats = DetailedCacheMetrics {
        metrics,
        sets: counters.sets,
        evictions: counters.evictions,
        efficiency_score: optimizer.calculate_efficiency_score(&metrics),
        performance: optimizer.analyze_performance(&metrics).rating,
        dynamic_sizing: true,
        recommended_size: optimizer.calculate_optimal_size(&metrics, cache.capacity()),
    };

    let report = CacheHealthReport::new("rotating", stats);
    assert_eq!(report.health, CacheHealth::Critical);
    assert_eq!(report.stats.recommended_size, 15);
    assert_eq!(CacheMetrics::total([&metrics]).misses, 200);
}
