use super::{StoreBackend, StoreError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct Entry {
    payload: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process store used for development and tests.
///
/// Durability is out of scope here; the Redis backend is the one deployed.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_entry(&self, key: &str, payload: String, ttl: Option<Duration>) {
        let mut entries = self.entries.write().expect("memory store lock poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                payload,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn put<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        self.write_entry(key, serialized, None);
        Ok(())
    }

    async fn put_ex<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(value)?;
        self.write_entry(key, serialized, Some(Duration::from_secs(ttl_secs)));
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let entries = self.entries.read().expect("memory store lock poisoned");
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => serde_json::from_str(&entry.payload)
                .map_err(|e| StoreError::Deserialization(e.to_string()))
                .map(Some),
            _ => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().expect("memory store lock poisoned");
        match entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn scan_prefix<T: DeserializeOwned + Send + Sync>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, StoreError> {
        let entries = self.entries.read().expect("memory store lock poisoned");
        let mut results = Vec::new();
        for (key, entry) in entries.iter() {
            if key.starts_with(prefix) && !entry.is_expired() {
                let value = serde_json::from_str(&entry.payload)
                    .map_err(|e| StoreError::Deserialization(e.to_string()))?;
                results.push(value);
            }
        }
        Ok(results)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
