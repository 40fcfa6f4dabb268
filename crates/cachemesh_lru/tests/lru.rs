// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for [`LruCache`] eviction behavior.

use std::sync::{Arc, Mutex};

use cachemesh_lru::LruCache;

fn recording_hook(sink: &Arc<Mutex<Vec<String>>>) -> impl FnMut(String, String) + Send + 'static {
    let sink = Arc::clone(sink);
    move |key, _value| sink.lock().unwrap().push(key)
}

#[test]
fn hit_and_miss() {
    let mut cache: LruCache<String> = LruCache::new(0);
    cache.put("key1", "1234".to_string());

    assert_eq!(cache.get("key1"), Some(&"1234".to_string()));
    assert!(cache.get("key2").is_none());
}

#[test]
fn evicts_least_recently_used() {
    // Budget exactly fits the first two entries; the third pushes the
    // oldest one out.
    let budget = ("key1".len() + "key2".len() + "value1".len() + "value2".len()) as i64;
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let mut cache = LruCache::with_eviction_hook(budget, recording_hook(&evicted));

    cache.put("key1", "value1".to_string());
    cache.put("key2", "value2".to_string());
    cache.put("k3", "v3".to_string());

    assert!(cache.get("key1").is_none());
    assert_eq!(cache.len(), 2);
    assert_eq!(evicted.lock().unwrap().as_slice(), ["key1"]);
}

#[test]
fn eviction_hook_fires_in_order() {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let mut cache = LruCache::with_eviction_hook(10, recording_hook(&evicted));

    cache.put("key1", "123456".to_string());
    cache.put("k2", "k2".to_string());
    cache.put("k3", "k3".to_string());
    cache.put("k4", "k4".to_string());

    assert_eq!(evicted.lock().unwrap().as_slice(), ["key1", "k2"]);
    assert_eq!(cache.len(), 2);
}

#[test]
fn zero_budget_never_evicts() {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let mut cache = LruCache::with_eviction_hook(0, recording_hook(&evicted));

    for i in 0..1000 {
        cache.put(format!("key-{i}"), "x".repeat(64));
    }

    assert_eq!(cache.len(), 1000);
    assert!(evicted.lock().unwrap().is_empty());
}

#[test]
fn oversized_entry_is_evicted_immediately() {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let mut cache = LruCache::with_eviction_hook(8, recording_hook(&evicted));

    cache.put("big", "0123456789".to_string()); // cost 13 > budget 8

    assert_eq!(cache.len(), 0);
    assert_eq!(cache.used_bytes(), 0);
    assert_eq!(evicted.lock().unwrap().as_slice(), ["big"]);
}

#[test]
fn accounting_tracks_entry_costs() {
    let mut cache: LruCache<String> = LruCache::new(0);
    cache.put("a", "12".to_string());
    cache.put("bb", "345".to_string());
    assert_eq!(cache.used_bytes(), 3 + 5);

    // Replacement bills only the delta.
    cache.put("a", "1".to_string());
    assert_eq!(cache.used_bytes(), 2 + 5);
}

#[test]
fn replacement_refreshes_recency() {
    let mut cache: LruCache<String> = LruCache::new(12);
    cache.put("a", "11".to_string()); // cost 3
    cache.put("b", "22".to_string()); // cost 3
    cache.put("a", "33".to_string()); // refresh, still cost 3
    cache.put("c", "4444444".to_string()); // cost 8 forces an eviction

    // "b" was the least recently used after "a" got rewritten.
    assert!(cache.get("b").is_none());
    assert!(cache.get("a").is_some());
    assert!(cache.get("c").is_some());
}
