//! Hosting cache with TTL and tag invalidation
//!
//! Caches key-to-hosting lookups to avoid a directory query on every request.
//! Keys are mode-qualified (`domain:<host>` or `slug:<slug>`) and every entry is
//! tagged with `hosting:<id>` so a settings change can evict all keys that point
//! at the same hosting.

use async_trait::async_trait;
use hostedge_shared::Hosting;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Errors from a cache backend. Callers on the request path treat these as misses.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Shared cache capability used by the hosting resolver
#[async_trait]
pub trait HostingCache: Send + Sync {
    /// Fresh entry for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Hosting>, CacheError>;

    /// Store `hosting` under `key` for `ttl`, tagged with `tags`
    async fn set(
        &self,
        key: &str,
        hosting: &Hosting,
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError>;

    /// Drop a single key
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every key stored with `tag`
    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError>;
}

/// Cache entry with expiration
#[derive(Clone)]
struct CacheEntry {
    hosting: Hosting,
    tags: Vec<String>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(hosting: Hosting, tags: Vec<String>, ttl: Duration) -> Self {
        Self {
            hosting,
            tags,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe in-process hosting cache
#[derive(Default)]
pub struct InMemoryHostingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryHostingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear expired entries (call periodically for memory management)
    pub fn cleanup(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        if let Ok(entries) = self.entries.read() {
            let total = entries.len();
            let expired = entries.values().filter(|e| e.is_expired()).count();
            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
            }
        } else {
            CacheStats::default()
        }
    }
}

#[async_trait]
impl HostingCache for InMemoryHostingCache {
    async fn get(&self, key: &str) -> Result<Option<Hosting>, CacheError> {
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;

        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.hosting.clone()))
    }

    async fn set(
        &self,
        key: &str,
        hosting: &Hosting,
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(
            key.to_string(),
            CacheEntry::new(hosting.clone(), tags.to_vec(), ttl),
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        Ok(())
    }
}

/// Cache statistics
#[derive(Default, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}
