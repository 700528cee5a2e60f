//! History cache store for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use chronicle_core::error::{CacheError, CacheResult};
use chronicle_core::models::CacheEntry;
use chronicle_core::ports::{CacheStore, cache_key};

use super::database::Database;
use crate::record::{decode_record, encode_record};

/// PostgreSQL implementation of CacheStore.
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn read(&self, account_address: &str) -> CacheResult<Option<CacheEntry>> {
        let key = cache_key(account_address);
        let row: Option<(Json<serde_json::Value>,)> =
            sqlx::query_as("SELECT record FROM history_cache WHERE storage_key = $1")
                .bind(&key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CacheError::Io(e.to_string()))?;

        Ok(row.and_then(|(Json(record),)| decode_record(&key, record)))
    }

    async fn write(&self, account_address: &str, entry: &CacheEntry) -> CacheResult<()> {
        let record = encode_record(entry)?;

        sqlx::query(
            r#"
            INSERT INTO history_cache (storage_key, account_address, record, written_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (storage_key) DO UPDATE SET
                account_address = EXCLUDED.account_address,
                record = EXCLUDED.record,
                written_at = EXCLUDED.written_at
            "#,
        )
        .bind(cache_key(account_address))
        .bind(account_address)
        .bind(Json(record))
        .bind(entry.written_at as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Io(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, account_address: Option<&str>) -> CacheResult<()> {
        let query = match account_address {
            Some(account) => sqlx::query("DELETE FROM history_cache WHERE storage_key = $1")
                .bind(cache_key(account)),
            None => sqlx::query("DELETE FROM history_cache"),
        };

        query
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?;

        Ok(())
    }
}
