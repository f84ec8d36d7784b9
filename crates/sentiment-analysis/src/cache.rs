//! Per-analyzer cache of post sentiment scores, keyed by content hash.
//!
//! Policy: insert first, then prune. Once the entry count exceeds
//! `max_entries`, expired entries are dropped; if that is not enough the
//! oldest entries are evicted until the cache is back at its limit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

pub const DEFAULT_TTL_SECS: i64 = 900;
pub const DEFAULT_MAX_ENTRIES: usize = 500;

struct CacheEntry {
    score: f64,
    cached_at: DateTime<Utc>,
}

pub struct SentimentCache {
    entries: DashMap<u64, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl SentimentCache {
    pub fn new(ttl_secs: i64, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
            max_entries: max_entries.max(1),
        }
    }

    fn key(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&self, text: &str) -> Option<f64> {
        self.get_at(text, Utc::now())
    }

    pub fn get_at(&self, text: &str, now: DateTime<Utc>) -> Option<f64> {
        let key = Self::key(text);
        let fresh = {
            let entry = self.entries.get(&key)?;
            if now - entry.cached_at < self.ttl {
                Some(entry.score)
            } else {
                None
            }
        };
        if fresh.is_none() {
            self.entries.remove(&key);
        }
        fresh
    }

    pub fn insert(&self, text: &str, score: f64) {
        self.insert_at(text, score, Utc::now());
    }

    pub fn insert_at(&self, text: &str, score: f64, now: DateTime<Utc>) {
        self.entries.insert(Self::key(text), CacheEntry { score, cached_at: now });
        if self.entries.len() > self.max_entries {
            self.prune(now);
        }
    }

    /// Cached score for `text`, computing and storing it on a miss
    pub fn get_or_insert_with(&self, text: &str, now: DateTime<Utc>, score: impl FnOnce() -> f64) -> f64 {
        if let Some(cached) = self.get_at(text, now) {
            return cached;
        }
        let value = score();
        self.insert_at(text, value, now);
        value
    }

    fn prune(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.cached_at < ttl);

        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(u64, DateTime<Utc>)> =
            self.entries.iter().map(|e| (*e.key(), e.value().cached_at)).collect();
        by_age.sort_by_key(|(_, cached_at)| *cached_at);
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        tracing::debug!("Sentiment cache evicted {} oldest entries", excess);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SentimentCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS, DEFAULT_MAX_ENTRIES)
    }
}
