//! Port trait for the Chain Access Gateway.
//!
//! This trait defines the read-only interface the history engine needs from
//! a Substrate-compatible node. Implementations live in the infrastructure
//! layer (e.g., `chronicle-substrate`); tests supply in-memory fakes.

use async_trait::async_trait;

use crate::error::ChainResult;
use crate::models::BlockHash;

/// Raw extrinsic as decoded by the gateway from node metadata.
#[derive(Debug, Clone)]
pub struct RawExtrinsic {
    /// Position within the block (the event phase index).
    pub index: u32,
    /// Extrinsic hash (0x-prefixed hex).
    pub hash: String,
    /// Pallet name (e.g., "Balances").
    pub pallet: String,
    /// Call name (e.g., "transfer_keep_alive").
    pub method: String,
    /// Signer address (None for unsigned/inherent).
    pub signer: Option<String>,
    /// Call arguments in declaration order.
    pub args: Vec<serde_json::Value>,
}

/// Raw event as decoded by the gateway.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Index in block.
    pub index: u32,
    /// Index of the extrinsic that emitted this event (None for
    /// initialization/finalization events).
    pub phase: Option<u32>,
    /// Pallet name.
    pub pallet: String,
    /// Event variant name.
    pub method: String,
    /// Event fields in declaration order.
    pub data: Vec<serde_json::Value>,
}

/// Port trait for reading blocks from a chain.
///
/// Every method is a suspending network call; callers bound them with
/// timeouts. The gateway never submits transactions.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Height of the current chain head.
    async fn current_height(&self) -> ChainResult<u64>;

    /// Hash of the block at `height`.
    async fn block_hash(&self, height: u64) -> ChainResult<BlockHash>;

    /// Extrinsics of a block, in block order.
    async fn extrinsics_of(&self, block: &BlockHash) -> ChainResult<Vec<RawExtrinsic>>;

    /// Events of a block, in emission order.
    async fn events_of(&self, block: &BlockHash) -> ChainResult<Vec<RawEvent>>;

    /// On-chain timestamp of a block in epoch milliseconds.
    async fn timestamp_of(&self, block: &BlockHash) -> ChainResult<u64>;
}
