//! Cache layer - failure policy around a [`CacheStore`].
//!
//! The cache is an optimisation. Read errors become misses and write or
//! clear errors are logged, so storage trouble never reaches a caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::metrics::record_cache_io_error;
use crate::models::CacheEntry;
use crate::ports::CacheStore;

/// Per-account history cache.
#[derive(Clone)]
pub struct HistoryCache {
    store: Arc<dyn CacheStore>,
}

impl HistoryCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Stored entry for an account, or `None` on miss or storage error.
    pub async fn read(&self, account_address: &str) -> Option<CacheEntry> {
        match self.store.read(account_address).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    account = %account_address,
                    error = %e,
                    "⚠️  Cache read failed, treating as miss"
                );
                record_cache_io_error("read");
                None
            }
        }
    }

    /// Replace an account's entry.
    pub async fn write(&self, account_address: &str, entry: &CacheEntry) {
        match self.store.write(account_address, entry).await {
            Ok(()) => debug!(
                account = %account_address,
                transactions = entry.transactions.len(),
                "Cache entry written"
            ),
            Err(e) => {
                warn!(account = %account_address, error = %e, "⚠️  Cache write failed");
                record_cache_io_error("write");
            }
        }
    }

    /// Drop one account's entry, or all entries.
    pub async fn clear(&self, account_address: Option<&str>) {
        if let Err(e) = self.store.clear(account_address).await {
            warn!(account = ?account_address, error = %e, "⚠️  Cache clear failed");
            record_cache_io_error("clear");
        }
    }
}
