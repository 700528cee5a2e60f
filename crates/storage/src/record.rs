//! Shared conversion between cache records and their JSON form.

use tracing::debug;

use chronicle_core::error::{CacheError, CacheResult};
use chronicle_core::models::CacheEntry;

/// Serialize an entry for storage.
pub(crate) fn encode_record(entry: &CacheEntry) -> CacheResult<serde_json::Value> {
    serde_json::to_value(entry).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Decode a stored record.
///
/// Unknown fields are ignored. A record missing required fields is treated
/// as absent rather than as an error.
pub(crate) fn decode_record(storage_key: &str, record: serde_json::Value) -> Option<CacheEntry> {
    match serde_json::from_value(record) {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!(key = storage_key, error = %e, "Ignoring undecodable cache record");
            None
        }
    }
}
