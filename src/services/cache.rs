// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory stale-while-revalidate cache.
//!
//! An explicit, injectable replacement for ad hoc module-level caches: each
//! entry is a `(value, cached_at)` pair, and reads past the TTL still return
//! the stale value flagged as such, so callers can serve it immediately and
//! refresh in the background. The cache is never the source of truth; the
//! backend record is authoritative.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::hash::Hash;

/// A cached value together with its freshness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<V> {
    pub value: V,
    /// False once the entry is older than the TTL; the caller should
    /// refresh, but may serve the value meanwhile.
    pub is_fresh: bool,
}

struct Entry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// Stale-while-revalidate cache keyed by `K`.
pub struct SwrCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> SwrCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Look up a value. Stale entries are returned with `is_fresh: false`
    /// rather than dropped.
    pub fn get(&self, key: &K) -> Option<Cached<V>> {
        self.entries.get(key).map(|entry| Cached {
            value: entry.value.clone(),
            is_fresh: Utc::now() - entry.cached_at < self.ttl,
        })
    }

    /// Insert or refresh a value, stamping it with the current time.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                cached_at: Utc::now(),
            },
        );
    }

    /// Drop an entry (e.g. after the underlying record was mutated).
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }
}
