//! GraphQL schema definition.
//!
//! Exposes account history lookups and cache invalidation on top of
//! [`HistoryService`].

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Object, Result, Schema};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use chronicle_core::error::HistoryError;
use chronicle_core::services::{HistoryFilter, HistoryService};

use crate::types::{Asset, ChronicleSchema, HistoryDirection, Transaction};

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth (introspection needs ~13).
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

/// Build the schema.
///
/// `shutdown` is the server's shutdown token: lookups still scanning when it
/// fires are cancelled.
pub fn build_schema(service: Arc<HistoryService>, shutdown: CancellationToken) -> ChronicleSchema {
    Schema::build(HistoryQuery, HistoryMutation, EmptySubscription)
        .data(service)
        .data(shutdown)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

// -----------------------------------------------------------------------------
// Query
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct HistoryQuery;

#[Object]
impl HistoryQuery {
    /// Transaction history of an account, newest first.
    async fn account_history<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        address: String,
        #[graphql(default)] direction: HistoryDirection,
        asset: Option<Asset>,
        limit: Option<i32>,
    ) -> Result<Vec<Transaction>> {
        validate_address(&address)?;
        debug!(address = %address, ?direction, "accountHistory");
        let service = ctx.data::<Arc<HistoryService>>()?;
        let shutdown = ctx.data::<CancellationToken>()?;

        let filter = HistoryFilter {
            direction: direction.into(),
            asset: asset.map(Into::into),
            limit: limit.map(|l| validate_limit(l, service.config().max_results)),
        };

        let history = service
            .get_account_history(&address, &filter, &shutdown.child_token())
            .await
            .map_err(history_error)?;

        Ok(history.into_iter().map(<Transaction as From<_>>::from).collect())
    }
}

// -----------------------------------------------------------------------------
// Mutation
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct HistoryMutation;

#[Object]
impl HistoryMutation {
    /// Drop cached history for one account, or for every account.
    async fn clear_cache<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        address: Option<String>,
    ) -> Result<bool> {
        validate_filter_string(&address, "address")?;
        let service = ctx.data::<Arc<HistoryService>>()?;
        service.clear_cache(address.as_deref()).await;
        Ok(true)
    }
}

// -----------------------------------------------------------------------------
// Helpers & Validation
// -----------------------------------------------------------------------------

/// Maximum length for an address argument.
const MAX_ADDRESS_LENGTH: usize = 128;

/// GraphQL error carrying a stable `code` extension.
fn history_error(err: HistoryError) -> async_graphql::Error {
    let code = match &err {
        HistoryError::ChainUnavailable(_) => "CHAIN_UNAVAILABLE",
        HistoryError::Cancelled => "CANCELLED",
        HistoryError::InvalidAddress(_) => "INVALID_ADDRESS",
        HistoryError::Internal(_) => "INTERNAL",
    };
    async_graphql::Error::new(err.to_string()).extend_with(|_, e| e.set("code", code))
}

fn validate_address(address: &str) -> Result<()> {
    validate_filter_string(&Some(address.to_string()), "address")
}

/// Validate a string parameter.
fn validate_filter_string(s: &Option<String>, field_name: &str) -> Result<()> {
    if let Some(value) = s {
        if value.len() > MAX_ADDRESS_LENGTH {
            return Err(async_graphql::Error::new(format!(
                "{} too long: maximum {} characters allowed",
                field_name, MAX_ADDRESS_LENGTH
            )));
        }
        if value.trim().is_empty() {
            return Err(async_graphql::Error::new(format!(
                "{} cannot be empty",
                field_name
            ))
            .extend_with(|_, e| e.set("code", "INVALID_ADDRESS")));
        }
    }
    Ok(())
}

/// Clamp a requested limit to `1..=max`.
fn validate_limit(limit: i32, max: usize) -> usize {
    (limit.max(1) as usize).min(max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    use chronicle_core::models::{self, CacheEntry};
    use chronicle_core::ports::CacheStore;
    use chronicle_storage::MemoryCacheStore;

    use crate::testing::offline_service;

    fn tx(block: u64, from: &str, to: &str, asset: models::Asset) -> models::Transaction {
        models::Transaction {
            hash: format!("0x{:02x}", block),
            block_number: block,
            timestamp: 1_700_000_000_000 + block * 6_000,
            kind: models::TransactionKind::Transfer,
            from: from.into(),
            to: to.into(),
            amount: "1.00".into(),
            asset,
            status: models::TransactionStatus::Success,
            fee: "0".into(),
            metadata: None,
        }
    }

    async fn schema_with_cached(transactions: Vec<models::Transaction>) -> ChronicleSchema {
        let store = Arc::new(MemoryCacheStore::new());
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        store
            .write(
                "Alice",
                &CacheEntry {
                    account_address: "Alice".into(),
                    last_block_scanned: 120,
                    transactions,
                    written_at: now,
                },
            )
            .await
            .unwrap();

        build_schema(offline_service(store), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_account_history_from_cache() {
        let schema = schema_with_cached(vec![
            tx(110, "Bob", "Alice", models::Asset::BBzd),
            tx(105, "Alice", "Bob", models::Asset::Dalla),
        ])
        .await;

        let res = schema
            .execute(
                r#"{ accountHistory(address: "Alice", direction: RECEIVED) {
                    blockNumber kind asset from
                } }"#,
            )
            .await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);

        let data = res.data.into_json().unwrap();
        assert_eq!(
            data,
            serde_json::json!({ "accountHistory": [
                { "blockNumber": 110, "kind": "TRANSFER", "asset": "BBZD", "from": "Bob" }
            ] })
        );
    }

    #[tokio::test]
    async fn test_asset_filter_and_limit() {
        let schema = schema_with_cached(vec![
            tx(110, "Alice", "Bob", models::Asset::Dalla),
            tx(108, "Alice", "Carol", models::Asset::Dalla),
            tx(105, "Alice", "Bob", models::Asset::BBzd),
        ])
        .await;

        let res = schema
            .execute(r#"{ accountHistory(address: "Alice", asset: DALLA, limit: 1) { to } }"#)
            .await;
        let data = res.data.into_json().unwrap();
        assert_eq!(data["accountHistory"], serde_json::json!([{ "to": "Bob" }]));
    }

    #[tokio::test]
    async fn test_chain_unavailable_has_error_code() {
        let schema = schema_with_cached(vec![]).await;

        let res = schema
            .execute(r#"{ accountHistory(address: "Bob") { hash } }"#)
            .await;
        assert_eq!(res.errors.len(), 1);
        let code = res.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("CHAIN_UNAVAILABLE")));
    }

    #[tokio::test]
    async fn test_clear_cache_mutation() {
        let schema = schema_with_cached(vec![tx(110, "Alice", "Bob", models::Asset::Dalla)]).await;

        let res = schema.execute(r#"mutation { clearCache(address: "Alice") }"#).await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);

        // Le cache vidé, la requête retombe sur la chaîne hors ligne
        let res = schema
            .execute(r#"{ accountHistory(address: "Alice") { hash } }"#)
            .await;
        assert_eq!(res.errors.len(), 1);
    }

    // Tests de validation - protègent contre les entrées abusives

    #[test]
    fn test_validate_filter_string_boundaries() {
        assert!(validate_filter_string(&Some("  ".into()), "address").is_err());
        assert!(validate_filter_string(&Some("x".repeat(200)), "address").is_err());
        assert!(validate_filter_string(&None, "address").is_ok());
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(validate_limit(-100, 100), 1);
        assert_eq!(validate_limit(0, 100), 1);
        assert_eq!(validate_limit(10_000, 100), 100);
        assert_eq!(validate_limit(25, 100), 25);
    }
}
