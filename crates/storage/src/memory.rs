//! In-process cache store.
//!
//! Records are kept as serialized JSON strings, the same shape the
//! PostgreSQL store persists, so both adapters decode identically.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use chronicle_core::error::{CacheError, CacheResult};
use chronicle_core::models::CacheEntry;
use chronicle_core::ports::{CacheStore, cache_key};

use crate::record::{decode_record, encode_record};

/// Cache store backed by a process-local map.
#[derive(Default)]
pub struct MemoryCacheStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Unavailable("cache lock poisoned".into())
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, account_address: &str) -> CacheResult<Option<CacheEntry>> {
        let key = cache_key(account_address);
        let raw = {
            let records = self.records.read().map_err(poisoned)?;
            records.get(&key).cloned()
        };

        let Some(raw) = raw else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw)
            .ok()
            .and_then(|value| decode_record(&key, value)))
    }

    async fn write(&self, account_address: &str, entry: &CacheEntry) -> CacheResult<()> {
        let raw = encode_record(entry)?.to_string();
        self.records
            .write()
            .map_err(poisoned)?
            .insert(cache_key(account_address), raw);
        Ok(())
    }

    async fn clear(&self, account_address: Option<&str>) -> CacheResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        match account_address {
            Some(account) => {
                records.remove(&cache_key(account));
            }
            None => records.clear(),
        }
        Ok(())
    }
}
