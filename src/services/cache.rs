//! Response cache for read-mostly endpoints.
//!
//! Payloads are stored as JSON strings under fixed keys (lists, statistics)
//! or under [`SEARCH_PREFIX`] followed by the raw query string. Entries
//! expire after the configured TTL and, unless disabled, are evicted when a
//! write touches the records they were built from.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::Instant;

use crate::{config::CacheConfig, error::AppResult};

pub const AUTHOR_LIST: &str = "author_list";
pub const BOOK_LIST: &str = "book_list";
pub const STATISTICS: &str = "library_statistics";
pub const BORROWER_LIST: &str = "borrower_list";
pub const SEARCH_PREFIX: &str = "book_search:";

/// Cache key for a search request
pub fn search_key(raw_query: &str) -> String {
    format!("{}{}", SEARCH_PREFIX, raw_query)
}

/// Which records a write touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// Authors changed (book payloads embed author names)
    Authors,
    /// Books or their availability changed
    Books,
    /// Users or borrower profiles changed
    Members,
}

impl CacheScope {
    fn keys(self) -> &'static [&'static str] {
        match self {
            CacheScope::Authors => &[AUTHOR_LIST, BOOK_LIST, STATISTICS, BORROWER_LIST],
            CacheScope::Books => &[BOOK_LIST, STATISTICS, BORROWER_LIST],
            CacheScope::Members => &[STATISTICS],
        }
    }

    fn clears_searches(self) -> bool {
        matches!(self, CacheScope::Authors | CacheScope::Books)
    }
}

/// Key-value backend holding serialized responses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;
    async fn delete(&self, keys: &[String]) -> AppResult<()>;
    async fn delete_prefix(&self, prefix: &str) -> AppResult<()>;
}

/// Probability (1/N) of sweeping expired entries on insert once at capacity
const CLEANUP_PROBABILITY: u32 = 100;

/// Hard limit as a multiple of the soft capacity
const HARD_CAPACITY_MULTIPLIER: f32 = 1.5;

const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// In-process backend.
///
/// Expired entries are swept on insert: occasionally once the soft capacity
/// is reached, always at the hard limit. New keys are not stored while the
/// map is still at the hard limit after a sweep.
pub struct MemoryStore {
    entries: DashMap<String, (Instant, String)>,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn hard_limit(&self) -> usize {
        ((self.capacity as f32 * HARD_CAPACITY_MULTIPLIER) as usize).max(self.capacity)
    }

    /// Remove every expired entry
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, (expires_at, _)| *expires_at > now);
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            let (expires_at, value) = entry.value();
            if *expires_at > now {
                return Ok(Some(value.clone()));
            }
        }
        self.entries.remove_if(key, |_, (expires_at, _)| *expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let len = self.entries.len();
        let hard_limit = self.hard_limit();

        if len >= self.capacity {
            let should_cleanup = fastrand::u32(0..CLEANUP_PROBABILITY) == 0;
            if should_cleanup || len >= hard_limit {
                self.cleanup_expired();
            }
        }

        if self.entries.len() >= hard_limit && !self.entries.contains_key(key) {
            tracing::debug!(key, "memory cache full, entry not stored");
            return Ok(());
        }

        self.entries.insert(key.to_string(), (Instant::now() + ttl, value));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> AppResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<()> {
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// Read-through response cache with write eviction
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    invalidate_on_write: bool,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_seconds),
            invalidate_on_write: config.invalidate_on_write,
        }
    }

    /// Return the cached payload for `key`, or load, store and return it.
    ///
    /// Backend failures are logged and treated as misses.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(e) => tracing::warn!(key, "discarding unreadable cache entry: {}", e),
            },
            Ok(None) => tracing::debug!(key, "cache miss"),
            Err(e) => tracing::warn!(key, "cache read failed: {}", e),
        }

        let value = load().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(key, raw, self.ttl).await {
                    tracing::warn!(key, "cache write failed: {}", e);
                }
            }
            Err(e) => tracing::warn!(key, "cannot serialize response for cache: {}", e),
        }

        Ok(value)
    }

    /// Evict entries derived from the records in `scope`
    pub async fn invalidate(&self, scope: CacheScope) {
        if !self.invalidate_on_write {
            return;
        }

        let keys: Vec<String> = scope.keys().iter().map(|k| k.to_string()).collect();
        if let Err(e) = self.store.delete(&keys).await {
            tracing::warn!(?scope, "cache eviction failed: {}", e);
        }
        if scope.clears_searches() {
            if let Err(e) = self.store.delete_prefix(SEARCH_PREFIX).await {
                tracing::warn!(?scope, "search cache eviction failed: {}", e);
            }
        }
    }
}
