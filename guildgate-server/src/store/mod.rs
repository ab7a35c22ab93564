use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod memory;
pub mod redis;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse stored document: {0}")]
    Deserialization(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Contract every store backend must fulfill.
///
/// The service treats persistence as a document store keyed by composite
/// string identifiers (`verified:{discord_id}`, `admins:{guild}:{subject}`,
/// ...). Documents are JSON-serialized; `scan_prefix` supports the
/// guild-scoped listings. Implementations must be thread-safe and cloneable
/// so they can be shared across handlers.
#[async_trait::async_trait]
pub trait StoreBackend: Send + Sync {
    /// Store a document with no expiry
    async fn put<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), StoreError>;

    /// Store a document that the backend may drop after `ttl_secs`.
    ///
    /// Expiry here is housekeeping only; callers that care about time
    /// bounds must still check their own timestamps on read.
    async fn put_ex<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    /// Retrieve a document
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError>;

    /// Delete a document, reporting whether it existed
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Retrieve every document whose key starts with `prefix`
    async fn scan_prefix<T: DeserializeOwned + Send + Sync>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, StoreError>;

    /// Performs a deep health check on the store backend
    async fn health_check(&self) -> Result<(), String>;
}

/// Store implementation that provides a uniform interface regardless of
/// backend. The concrete implementation is chosen at runtime from the
/// application configuration.
#[derive(Clone)]
pub enum Store {
    /// In-process store backed by a hash map
    Memory(memory::MemoryStore),
    /// Redis-backed store
    Redis(redis::RedisStore),
}

#[async_trait::async_trait]
impl StoreBackend for Store {
    async fn put<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put(key, value).await,
            Self::Redis(store) => store.put(key, value).await,
        }
    }

    async fn put_ex<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put_ex(key, value, ttl_secs).await,
            Self::Redis(store) => store.put_ex(key, value, ttl_secs).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::Redis(store) => store.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        match self {
            Self::Memory(store) => store.delete(key).await,
            Self::Redis(store) => store.delete(key).await,
        }
    }

    async fn scan_prefix<T: DeserializeOwned + Send + Sync>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, StoreError> {
        match self {
            Self::Memory(store) => store.scan_prefix(prefix).await,
            Self::Redis(store) => store.scan_prefix(prefix).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::Memory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }
}

/// Factory function to create the appropriate store implementation based on
/// configuration.
pub async fn create_store(config: &crate::config::GateConfig) -> Result<Store, StoreError> {
    match config.store.kind {
        crate::config::StoreKind::Memory => Ok(Store::Memory(memory::MemoryStore::new())),
        crate::config::StoreKind::Redis => {
            if config.store.redis_url.is_empty() {
                return Err(StoreError::Config(
                    "Redis URL is required for the Redis store".to_string(),
                ));
            }
            let store = redis::RedisStore::new(&config.store.redis_url)
                .await
                .map_err(StoreError::Config)?;
            Ok(Store::Redis(store))
        }
    }
}
