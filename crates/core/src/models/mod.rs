//! Domain models for account transaction history.
//!
//! These models are storage-agnostic and represent the canonical form of
//! history data within the domain layer. Field names serialize in camelCase
//! because the same shape is persisted by the cache layer.

mod address;
mod amount;
mod event;

use serde::{Deserialize, Serialize};

pub use address::parse_address;
pub use amount::{DEFAULT_DECIMALS, format_amount, parse_amount};
pub use event::{ChainEvent, extrinsic_succeeded, fee_paid};

// =============================================================================
// Block Identification
// =============================================================================

/// 32-byte block hash (Blake2-256).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    /// Convert to 0x-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Classification of a transaction.
///
/// The classifier only produces the known kinds. `Unknown` exists so that a
/// cached record written by a newer version still deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
    Staking,
    Governance,
    Reward,
    MerchantSwap,
    #[serde(other)]
    Unknown,
}

/// Asset a transaction amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native DALLA token.
    #[serde(rename = "DALLA")]
    Dalla,
    /// Belize dollar stablecoin.
    #[serde(rename = "bBZD")]
    BBzd,
}

impl Asset {
    /// Ticker as shown to users.
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Dalla => "DALLA",
            Asset::BBzd => "bBZD",
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("dalla") {
            Ok(Asset::Dalla)
        } else if s.eq_ignore_ascii_case("bbzd") {
            Ok(Asset::BBzd)
        } else {
            Err(format!("Unknown asset '{}'. Use 'DALLA' or 'bBZD'.", s))
        }
    }
}

/// Execution status of the extrinsic behind a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Descriptive extras attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    pub pallet_name: String,
    pub method_name: String,
    pub description: String,
}

/// Normalized transaction record for one (account, extrinsic) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Extrinsic hash (0x-prefixed hex).
    pub hash: String,
    /// Block number containing the extrinsic.
    pub block_number: u64,
    /// On-chain block timestamp in epoch milliseconds.
    pub timestamp: u64,
    pub kind: TransactionKind,
    pub from: String,
    /// Counterparty account, or a module placeholder such as `"Staking"`.
    pub to: String,
    /// Decimal string in human units.
    pub amount: String,
    pub asset: Asset,
    pub status: TransactionStatus,
    /// Decimal string in human units, `"0"` when unknown.
    pub fee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TransactionMetadata>,
}

// =============================================================================
// Cache State
// =============================================================================

/// Cached scan result for one account.
///
/// Replaced wholesale on every completed scan, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub account_address: String,
    /// Newest block covered by the scan.
    pub last_block_scanned: u64,
    pub transactions: Vec<Transaction>,
    /// Wall-clock write time in epoch milliseconds.
    pub written_at: u64,
}

impl CacheEntry {
    /// Whether the entry is still usable at `now_ms` given a freshness window.
    pub fn is_fresh(&self, now_ms: u64, freshness_ms: u64) -> bool {
        now_ms.saturating_sub(self.written_at) <= freshness_ms
    }
}

// =============================================================================
// Names
// =============================================================================

/// Normalize a pallet, call or event name for matching.
///
/// Node metadata reports `Balances` / `transfer_keep_alive` while JS clients
/// report `balances` / `transferKeepAlive`; both normalize the same way.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
