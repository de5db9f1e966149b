//! Redis service backing the response cache

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

use super::cache::CacheStore;

const NAMESPACE: &str = "libris:cache:";
/// Set tracking every live cache key, so prefixes can be evicted without SCAN
const KEY_INDEX: &str = "libris:cache-index";
/// Probability (1/N) of pruning the key index on a cache write
const PRUNE_PROBABILITY: u32 = 100;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    /// Get a Redis connection
    pub async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", NAMESPACE, key)
    }

    /// Drop index members whose cache entry has already expired
    async fn prune_index(&self, conn: &mut redis::aio::MultiplexedConnection) -> AppResult<()> {
        let indexed: Vec<String> = conn
            .smembers(KEY_INDEX)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read cache index from Redis: {}", e)))?;
        if indexed.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for key in &indexed {
            pipe.exists(key);
        }
        let exists: Vec<bool> = pipe
            .query_async(&mut *conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to check cache entries in Redis: {}", e)))?;

        let expired: Vec<&String> = indexed
            .iter()
            .zip(exists)
            .filter(|(_, exists)| !exists)
            .map(|(key, _)| key)
            .collect();
        if expired.is_empty() {
            return Ok(());
        }

        conn.srem::<_, _, ()>(KEY_INDEX, &expired)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to unindex cache entries in Redis: {}", e)))?;
        tracing::debug!(count = expired.len(), "pruned expired cache index entries");
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisService {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        conn.get(Self::namespaced(key))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read cache entry from Redis: {}", e)))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let key = Self::namespaced(key);

        conn.set_ex::<_, _, ()>(&key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store cache entry in Redis: {}", e)))?;
        conn.sadd::<_, _, ()>(KEY_INDEX, &key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to index cache entry in Redis: {}", e)))?;
        // The index outlives idle periods by at most one TTL
        conn.expire::<_, ()>(KEY_INDEX, ttl.as_secs().max(1) as i64)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to set cache index expiry in Redis: {}", e)))?;

        if fastrand::u32(0..PRUNE_PROBABILITY) == 0 {
            self.prune_index(&mut conn).await?;
        }

        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.get_connection().await?;
        let keys: Vec<String> = keys.iter().map(|k| Self::namespaced(k)).collect();

        conn.del::<_, ()>(&keys)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete cache entries from Redis: {}", e)))?;
        conn.srem::<_, _, ()>(KEY_INDEX, &keys)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to unindex cache entries in Redis: {}", e)))?;

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        self.prune_index(&mut conn).await?;
        let prefix = Self::namespaced(prefix);

        let indexed: Vec<String> = conn
            .smembers(KEY_INDEX)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read cache index from Redis: {}", e)))?;
        let matching: Vec<String> = indexed.into_iter().filter(|k| k.starts_with(&prefix)).collect();
        if matching.is_empty() {
            return Ok(());
        }

        conn.del::<_, ()>(&matching)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete cache entries from Redis: {}", e)))?;
        conn.srem::<_, _, ()>(KEY_INDEX, &matching)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to unindex cache entries in Redis: {}", e)))?;

        Ok(())
    }
}
