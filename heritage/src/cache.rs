use crate::domain::CacheKey;
use moka::future::Cache;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::Instant;

/// A stored successful read and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Moka-backed store of recent public reads.
/// Freshness is checked on read against the TTL; a stale entry is never
/// returned and is overwritten by the next successful fetch. The capacity
/// bound only limits how many distinct keys are kept.
pub struct ResponseCache {
    entries: Cache<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .name("heritage-responses")
                .max_capacity(max_entries)
                .build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_fresh(&self, key: &CacheKey) -> Option<Value> {
        let entry = self.entries.get(key).await?;
        if entry.is_fresh(self.ttl) {
            Some(entry.value)
        } else {
            None
        }
    }

    pub async fn store(&self, key: CacheKey, value: Value) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };
        self.entries.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entry_count", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}
