// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Concurrency wrapper around the LRU core.

use cachemesh_lru::LruCache;
use parking_lot::Mutex;

use crate::ByteView;

/// A mutex-guarded, lazily-initialized LRU of [`ByteView`] values.
///
/// The LRU core is allocated on first use so that namespaces which never see
/// traffic cost nothing beyond the wrapper. Both operations take the lock
/// for the duration of the O(1) LRU work only; neither suspends.
pub(crate) struct GuardedCache {
    cache_bytes: i64,
    inner: Mutex<Option<LruCache<ByteView>>>,
}

impl GuardedCache {
    /// Creates a cache with the given byte budget (`0` = unbounded).
    pub(crate) fn new(cache_bytes: i64) -> Self {
        Self {
            cache_bytes,
            inner: Mutex::new(None),
        }
    }

    /// Looks up `key`, refreshing recency on a hit. Returns a cheap clone of
    /// the shared value buffer.
    pub(crate) fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock();
        let lru = guard.get_or_insert_with(|| LruCache::new(self.cache_bytes));
        lru.get(key).cloned()
    }

    /// Inserts or refreshes `key`, evicting under budget pressure.
    pub(crate) fn put(&self, key: &str, value: ByteView) {
        let mut guard = self.inner.lock();
        let lru = guard.get_or_insert_with(|| LruCache::new(self.cache_bytes));
        lru.put(key, value);
    }
}

impl std::fmt::Debug for GuardedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedCache")
            .field("cache_bytes", &self.cache_bytes)
            .finish_non_exhaustive()
    }
}
