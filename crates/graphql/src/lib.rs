//! GraphQL API for Chronicle.
//!
//! Serves account transaction history to wallets and explorers:
//!
//! ```graphql
//! query {
//!   accountHistory(address: "5Grw...", direction: SENT, asset: DALLA, limit: 20) {
//!     hash blockNumber time kind from to amount asset status fee
//!   }
//! }
//!
//! mutation { clearCache(address: "5Grw...") }
//! ```
//!
//! Errors carry a `code` extension (`CHAIN_UNAVAILABLE`, `CANCELLED`,
//! `INVALID_ADDRESS`, `INTERNAL`) so clients can tell an unreachable node
//! from an account with no history.

mod schema;
mod server;
#[cfg(test)]
mod testing;
mod types;

pub use schema::{
    HistoryMutation, HistoryQuery, MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, build_schema,
};
pub use server::{ServerConfig, serve_with_shutdown};
pub use types::{Asset, ChronicleSchema, HistoryDirection, Transaction, TransactionKind};
