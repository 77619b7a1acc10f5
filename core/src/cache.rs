//! LRU cache of full query rankings keyed by `(normalized query, version)`.
//!
//! The index version is part of the key, so a publish makes every older entry
//! unreachable without touching the cache. [`ResultCache::retain_version`]
//! additionally drops those entries to bound memory.

use crate::scorer::RankedDoc;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub version: u64,
}

impl CacheKey {
    pub fn new(query: impl Into<String>, version: u64) -> Self {
        Self { query: query.into(), version }
    }
}

pub type CachedRanking = Arc<Vec<RankedDoc>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

pub struct ResultCache {
    inner: Option<Mutex<LruCache<CacheKey, CachedRanking>>>, // None when disabled
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// A capacity of zero disables caching; every lookup misses.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, query: &str, version: u64) -> Option<CachedRanking> {
        let found = self
            .inner
            .as_ref()
            .and_then(|inner| inner.lock().get(&CacheKey::new(query, version)).cloned());
        match found {
            Some(ranking) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(query, version, "result cache hit");
                Some(ranking)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, query: &str, version: u64, ranking: CachedRanking) {
        if let Some(inner) = &self.inner {
            inner.lock().put(CacheKey::new(query, version), ranking);
        }
    }

    /// Drop every entry stored under a version other than `version`.
    pub fn retain_version(&self, version: u64) -> usize {
        let Some(inner) = &self.inner else { return 0 };
        let mut cache = inner.lock();
        let stale: Vec<CacheKey> =
            cache.iter().filter(|(k, _)| k.version != version).map(|(k, _)| k.clone()).collect();
        for key in &stale {
            cache.pop(key);
        }
        stale.len()
    }

    pub fn clear(&self) {
        if let Some(inner) = &self.inner {
            inner.lock().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().len())
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn capacity(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().cap().get())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
