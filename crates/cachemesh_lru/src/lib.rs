// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Byte-budgeted LRU eviction core.
//!
//! This crate provides [`LruCache`], a single-threaded LRU cache that bills
//! entries by byte cost instead of entry count. The cost of an entry is the
//! length of its key plus the [`Weighted::weight`] of its value. Once the
//! running total exceeds the configured budget, entries are evicted from the
//! least-recently-used end until the total fits again.
//!
//! The cache is intentionally not thread-safe; callers that share it across
//! threads wrap it in their own lock. Recency maintenance, lookup, and
//! eviction are all O(1).
//!
//! # Example
//!
//! ```
//! use cachemesh_lru::LruCache;
//!
//! let mut cache: LruCache<String> = LruCache::new(64);
//! cache.put("alpha", "one".to_string());
//! cache.put("beta", "two".to_string());
//!
//! assert_eq!(cache.get("alpha"), Some(&"one".to_string()));
//! assert_eq!(cache.len(), 2);
//! ```
//!
//! # Eviction hook
//!
//! An optional hook observes every evicted entry, in eviction order:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use cachemesh_lru::LruCache;
//!
//! let evicted = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&evicted);
//! let mut cache = LruCache::with_eviction_hook(10, move |key, _value: String| {
//!     sink.lock().unwrap().push(key);
//! });
//!
//! cache.put("key1", "123456".to_string()); // cost 10, fills the budget
//! cache.put("k2", "k2".to_string());       // overflow evicts "key1"
//! assert_eq!(evicted.lock().unwrap().as_slice(), ["key1"]);
//! ```

use rustc_hash::FxHashMap;

/// Reports the in-memory byte size of a cached value.
///
/// The returned weight feeds the cache's byte accounting and must stay
/// stable for as long as the value is cached.
pub trait Weighted {
    /// Size of the value in bytes.
    fn weight(&self) -> usize;
}

impl Weighted for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Hook invoked with each evicted entry.
type EvictionHook<V> = Box<dyn FnMut(String, V) + Send>;

/// A slot in the recency list. Slots live in a stable arena so list links
/// are plain indices rather than pointers.
struct Slot<V> {
    key: String,
    value: V,
    cost: i64,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A byte-budgeted LRU cache.
///
/// Entries are ordered from most-recently-used (front) to least-recently-used
/// (back). `get` and `put` both refresh recency. After every `put`, entries
/// are evicted from the back while the accounted bytes exceed the budget; an
/// entry whose own cost exceeds the entire budget is therefore inserted and
/// immediately evicted again. A budget of `0` disables eviction entirely.
///
/// Byte accounting only covers key and value bytes; the arena and index
/// overhead is not billed, so callers should size their budget with slack.
///
/// Not thread-safe. All operations are O(1).
pub struct LruCache<V> {
    max_bytes: i64,
    used_bytes: i64,
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    index: FxHashMap<String, usize>,
    on_evict: Option<EvictionHook<V>>,
}

impl<V: Weighted> LruCache<V> {
    /// Creates a cache with the given byte budget. A budget of `0` means
    /// unbounded.
    ///
    /// # Panics
    ///
    /// Panics if `max_bytes` is negative.
    #[must_use]
    pub fn new(max_bytes: i64) -> Self {
        assert!(max_bytes >= 0, "cache budget must be non-negative");
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            index: FxHashMap::default(),
            on_evict: None,
        }
    }

    /// Creates a cache whose evictions are observed by `hook`.
    ///
    /// The hook receives ownership of the evicted key and value and fires
    /// exactly once per evicted entry, in eviction order.
    #[must_use]
    pub fn with_eviction_hook(max_bytes: i64, hook: impl FnMut(String, V) + Send + 'static) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evict = Some(Box::new(hook));
        cache
    }

    /// Looks up `key`, refreshing its recency on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.touch(id);
        self.slots[id].as_ref().map(|slot| &slot.value)
    }

    /// Inserts or replaces the value for `key`, then evicts from the back
    /// while the accounted bytes exceed the budget.
    ///
    /// Replacing an existing key adjusts the accounting by the cost delta and
    /// refreshes recency; the replaced value is dropped without invoking the
    /// eviction hook.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let weight = value.weight() as i64;

        if let Some(&id) = self.index.get(&key) {
            let slot = self.slots[id].as_mut().expect("indexed slot is occupied");
            let new_cost = slot.key.len() as i64 + weight;
            self.used_bytes += new_cost - slot.cost;
            slot.cost = new_cost;
            slot.value = value;
            self.touch(id);
        } else {
            let cost = key.len() as i64 + weight;
            let id = self.alloc(Slot {
                key: key.clone(),
                value,
                cost,
                prev: None,
                next: None,
            });
            self.index.insert(key, id);
            self.push_front(id);
            self.used_bytes += cost;
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            self.evict_back();
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Accounted bytes currently held.
    #[must_use]
    pub fn used_bytes(&self) -> i64 {
        self.used_bytes
    }

    /// The configured byte budget (`0` = unbounded).
    #[must_use]
    pub fn max_bytes(&self) -> i64 {
        self.max_bytes
    }

    /// Removes the least-recently-used entry and reports it to the eviction
    /// hook.
    fn evict_back(&mut self) {
        let id = self.tail.expect("over-budget cache has a tail entry");
        self.detach(id);
        let slot = self.slots[id].take().expect("tail slot is occupied");
        self.free.push(id);
        self.index.remove(&slot.key);
        self.used_bytes -= slot.cost;
        assert!(self.used_bytes >= 0, "cost accounting underflow");
        if let Some(hook) = self.on_evict.as_mut() {
            hook(slot.key, slot.value);
        }
    }

    /// Stores a slot in the arena, reusing a freed position when available.
    fn alloc(&mut self, slot: Slot<V>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(slot);
                id
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    /// Moves an attached slot to the front of the recency list.
    fn touch(&mut self, id: usize) {
        if self.head == Some(id) {
            return;
        }
        self.detach(id);
        self.push_front(id);
    }

    fn detach(&mut self, id: usize) {
        let (prev, next) = {
            let slot = self.slots[id].as_ref().expect("detached slot is occupied");
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p].as_mut().expect("linked slot is occupied").next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].as_mut().expect("linked slot is occupied").prev = prev,
            None => self.tail = prev,
        }
        let slot = self.slots[id].as_mut().expect("detached slot is occupied");
        slot.prev = None;
        slot.next = None;
    }

    fn push_front(&mut self, id: usize) {
        let old_head = self.head;
        {
            let slot = self.slots[id].as_mut().expect("attached slot is occupied");
            slot.prev = None;
            slot.next = old_head;
        }
        if let Some(h) = old_head {
            self.slots[h].as_mut().expect("linked slot is occupied").prev = Some(id);
        }
        self.head = Some(id);
        if self.tail.is_none() {
            self.tail = Some(id);
        }
    }
}

impl<V> std::fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .finish_non_exhaustive()
    }
}
