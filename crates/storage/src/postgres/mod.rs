//! PostgreSQL storage adapter.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgCacheStore`] - `CacheStore` over the `history_cache` table
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_cache(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = PgCacheStore::new(&db);
//! ```

mod cache_store;
mod database;

pub use cache_store::PgCacheStore;
pub use database::{Database, DatabaseConfig};
