//! Port traits for cache storage, its health and time.
//!
//! The store is dumb storage: it returns whatever it holds and leaves
//! freshness policy to the history facade.

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::models::CacheEntry;

/// Prefix of the storage key derived from an account address.
pub const CACHE_KEY_PREFIX: &str = "tx_history_cache:";

/// Storage key for an account's cache record.
pub fn cache_key(account_address: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, account_address)
}

/// Durable per-account storage of scan results.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the record for an account.
    ///
    /// Returns `Ok(None)` when no record exists or the stored record cannot
    /// be decoded into a [`CacheEntry`].
    async fn read(&self, account_address: &str) -> CacheResult<Option<CacheEntry>>;

    /// Replace the record for an account.
    async fn write(&self, account_address: &str, entry: &CacheEntry) -> CacheResult<()>;

    /// Remove one account's record, or every record when `None`.
    async fn clear(&self, account_address: Option<&str>) -> CacheResult<()>;
}

/// Liveness check of a storage backend, reported by the HTTP health route.
#[async_trait]
pub trait StorageHealth: Send + Sync {
    async fn is_healthy(&self) -> bool;
}

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}
