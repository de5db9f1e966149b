//! Business logic services

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod loans;
pub mod redis;
pub mod stats;

use std::sync::Arc;

use crate::{
    config::{AppConfig, CacheBackend},
    error::AppResult,
    repository::Repository,
};

use cache::{CacheStore, MemoryStore, ResponseCache};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
    pub cache: ResponseCache,
}

impl Services {
    /// Create all services over the given repository and cache store
    pub fn new(repository: Repository, config: &AppConfig, store: Arc<dyn CacheStore>) -> Self {
        let cache = ResponseCache::new(store, &config.cache);
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone(), cache.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), cache.clone()),
            loans: loans::LoansService::new(repository.clone(), cache.clone()),
            stats: stats::StatsService::new(repository.clone(), cache.clone()),
            repository,
            cache,
        }
    }

    /// Open the cache backend selected in configuration
    pub async fn cache_store(config: &AppConfig) -> AppResult<Arc<dyn CacheStore>> {
        match config.cache.backend {
            CacheBackend::Redis => {
                let redis = self::redis::RedisService::new(&config.redis.url).await?;
                tracing::info!("Connected to Redis");
                Ok(Arc::new(redis))
            }
            CacheBackend::Memory => Ok(Arc::new(MemoryStore::with_capacity(config.cache.memory_capacity))),
        }
    }
}
