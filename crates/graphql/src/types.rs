//! GraphQL type definitions.

use async_graphql::{Enum, EmptySubscription, Schema, SimpleObject};
use chrono::{DateTime, Utc};

use chronicle_core::models;
use chronicle_core::services::Direction;

use crate::schema::{HistoryMutation, HistoryQuery};

/// The Chronicle GraphQL schema type.
pub type ChronicleSchema = Schema<HistoryQuery, HistoryMutation, EmptySubscription>;

/// Transaction kind.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Transfer,
    Staking,
    Governance,
    Reward,
    MerchantSwap,
    Unknown,
}

impl From<models::TransactionKind> for TransactionKind {
    fn from(kind: models::TransactionKind) -> Self {
        match kind {
            models::TransactionKind::Transfer => Self::Transfer,
            models::TransactionKind::Staking => Self::Staking,
            models::TransactionKind::Governance => Self::Governance,
            models::TransactionKind::Reward => Self::Reward,
            models::TransactionKind::MerchantSwap => Self::MerchantSwap,
            models::TransactionKind::Unknown => Self::Unknown,
        }
    }
}

/// Asset an amount is denominated in.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asset {
    Dalla,
    #[graphql(name = "BBZD")]
    BBzd,
}

impl From<models::Asset> for Asset {
    fn from(asset: models::Asset) -> Self {
        match asset {
            models::Asset::Dalla => Self::Dalla,
            models::Asset::BBzd => Self::BBzd,
        }
    }
}

impl From<Asset> for models::Asset {
    fn from(asset: Asset) -> Self {
        match asset {
            Asset::Dalla => Self::Dalla,
            Asset::BBzd => Self::BBzd,
        }
    }
}

#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl From<models::TransactionStatus> for TransactionStatus {
    fn from(status: models::TransactionStatus) -> Self {
        match status {
            models::TransactionStatus::Success => Self::Success,
            models::TransactionStatus::Failed => Self::Failed,
        }
    }
}

/// Which side of the history to return.
#[derive(Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryDirection {
    #[default]
    All,
    Sent,
    Received,
    Staking,
}

impl From<HistoryDirection> for Direction {
    fn from(direction: HistoryDirection) -> Self {
        match direction {
            HistoryDirection::All => Direction::All,
            HistoryDirection::Sent => Direction::Sent,
            HistoryDirection::Received => Direction::Received,
            HistoryDirection::Staking => Direction::Staking,
        }
    }
}

#[derive(SimpleObject)]
pub struct TransactionMetadata {
    pub pallet_name: String,
    pub method_name: String,
    pub description: String,
}

/// One transaction in an account's history.
#[derive(SimpleObject)]
pub struct Transaction {
    pub hash: String,
    pub block_number: i64,
    /// Block timestamp in epoch milliseconds.
    pub timestamp: i64,
    pub time: Option<DateTime<Utc>>,
    pub kind: TransactionKind,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub asset: Asset,
    pub status: TransactionStatus,
    pub fee: String,
    pub metadata: Option<TransactionMetadata>,
}

impl From<models::Transaction> for Transaction {
    fn from(t: models::Transaction) -> Self {
        let timestamp = t.timestamp as i64;
        Self {
            hash: t.hash,
            block_number: t.block_number as i64,
            timestamp,
            time: DateTime::from_timestamp_millis(timestamp),
            kind: t.kind.into(),
            from: t.from,
            to: t.to,
            amount: t.amount,
            asset: t.asset.into(),
            status: t.status.into(),
            fee: t.fee,
            metadata: t.metadata.map(|m| TransactionMetadata {
                pallet_name: m.pallet_name,
                method_name: m.method_name,
                description: m.description,
            }),
        }
    }
}
