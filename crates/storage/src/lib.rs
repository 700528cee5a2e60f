//! Storage layer for Chronicle.
//!
//! This crate provides implementations of the `CacheStore` port defined in
//! `chronicle-core`: an in-process store and a PostgreSQL store. Both keep
//! one JSON record per account under the key `tx_history_cache:<address>`.
//!
//! # Usage
//!
//! ```ignore
//! use chronicle_storage::{Database, DatabaseConfig, MemoryCacheStore, PgCacheStore};
//!
//! // Durable cache
//! let db = Database::connect(&DatabaseConfig::for_cache(&database_url)).await?;
//! db.migrate().await?;
//! let store: Arc<dyn CacheStore> = Arc::new(PgCacheStore::new(&db));
//!
//! // Or process-local
//! let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
//! ```

pub mod memory;
pub mod postgres;

mod record;

pub use memory::MemoryCacheStore;
pub use postgres::{Database, DatabaseConfig, PgCacheStore};
