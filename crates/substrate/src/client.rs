//! Substrate gateway with dynamic metadata decoding.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use subxt::backend::legacy::LegacyRpcMethods;
use subxt::backend::rpc::RpcClient;
use subxt::blocks::Block;
use subxt::events::Phase;
use subxt::utils::H256;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, trace};

use chronicle_core::error::{ChainError, ChainResult};
use chronicle_core::models::BlockHash;
use chronicle_core::ports::{ChainGateway, RawEvent, RawExtrinsic};

use crate::value::{fields_to_args, ss58};

/// Configuration for the Substrate gateway.
#[derive(Debug, Clone)]
pub struct SubstrateGatewayConfig {
    /// WebSocket URL (e.g., "ws://localhost:9944").
    pub ws_url: String,
}

impl Default for SubstrateGatewayConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:9944".to_string(),
        }
    }
}

pub type SubstrateBlock = Block<PolkadotConfig, OnlineClient<PolkadotConfig>>;

/// Blocks whose header and body stay shared between the per-block calls.
const RECENT_BLOCKS: usize = 32;

/// A block fetched once for `extrinsics_of`, `events_of` and `timestamp_of`.
#[derive(Default)]
struct FetchedBlock {
    block: OnceCell<SubstrateBlock>,
    extrinsics: OnceCell<Vec<RawExtrinsic>>,
}

/// Chain Access Gateway over a Substrate node.
///
/// Uses the legacy RPC backend: history lookups address arbitrary past
/// blocks by hash, which the chainHead API does not allow once a block is
/// unpinned.
pub struct SubstrateGateway {
    client: OnlineClient<PolkadotConfig>,
    rpc: LegacyRpcMethods<PolkadotConfig>,
    recent: Mutex<VecDeque<(BlockHash, Arc<FetchedBlock>)>>,
    closed: AtomicBool,
}

impl SubstrateGateway {
    /// Connect to a Substrate node.
    #[instrument(skip_all, fields(url = %config.ws_url))]
    pub async fn connect(config: &SubstrateGatewayConfig) -> ChainResult<Self> {
        debug!("Connecting to node");

        let rpc_client = RpcClient::from_url(&config.ws_url)
            .await
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;
        let client = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc_client.clone())
            .await
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;
        let rpc = LegacyRpcMethods::<PolkadotConfig>::new(rpc_client);

        debug!(
            spec_version = client.runtime_version().spec_version,
            "Connected successfully"
        );

        Ok(Self {
            client,
            rpc,
            recent: Mutex::new(VecDeque::with_capacity(RECENT_BLOCKS)),
            closed: AtomicBool::new(false),
        })
    }

    /// Close the gateway. Later calls fail with `ConnectionFailed`.
    ///
    /// The socket itself is released when the last handle is dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Chain gateway closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> ChainResult<()> {
        if self.is_closed() {
            return Err(ChainError::ConnectionFailed("gateway is closed".into()));
        }
        Ok(())
    }

    /// Shared fetch state for a block, evicting the oldest entry when full.
    fn fetched(&self, hash: &BlockHash) -> ChainResult<Arc<FetchedBlock>> {
        self.ensure_open()?;
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, fetched)) = recent.iter().find(|(h, _)| h == hash) {
            return Ok(Arc::clone(fetched));
        }
        if recent.len() >= RECENT_BLOCKS {
            recent.pop_front();
        }
        let fetched = Arc::new(FetchedBlock::default());
        recent.push_back((*hash, Arc::clone(&fetched)));
        Ok(fetched)
    }

    async fn block<'a>(
        &self,
        fetched: &'a FetchedBlock,
        hash: &BlockHash,
    ) -> ChainResult<&'a SubstrateBlock> {
        fetched
            .block
            .get_or_try_init(|| async {
                self.client
                    .blocks()
                    .at(H256(hash.0))
                    .await
                    .map_err(|e| ChainError::Rpc(e.to_string()))
            })
            .await
    }

    async fn extrinsics<'a>(
        &self,
        fetched: &'a FetchedBlock,
        hash: &BlockHash,
    ) -> ChainResult<&'a [RawExtrinsic]> {
        let extrinsics = fetched
            .extrinsics
            .get_or_try_init(|| async {
                let block = self.block(fetched, hash).await?;
                decode_extrinsics(block).await
            })
            .await?;
        Ok(extrinsics)
    }
}

#[async_trait]
impl ChainGateway for SubstrateGateway {
    async fn current_height(&self) -> ChainResult<u64> {
        self.ensure_open()?;
        let head = self
            .client
            .blocks()
            .at_latest()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(head.number() as u64)
    }

    async fn block_hash(&self, height: u64) -> ChainResult<BlockHash> {
        self.ensure_open()?;
        let hash = self
            .rpc
            .chain_get_block_hash(Some(height.into()))
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or(ChainError::BlockNotFound(height))?;

        Ok(BlockHash(hash.0))
    }

    async fn extrinsics_of(&self, hash: &BlockHash) -> ChainResult<Vec<RawExtrinsic>> {
        let fetched = self.fetched(hash)?;
        Ok(self.extrinsics(&fetched, hash).await?.to_vec())
    }

    async fn events_of(&self, hash: &BlockHash) -> ChainResult<Vec<RawEvent>> {
        let fetched = self.fetched(hash)?;
        let block = self.block(&fetched, hash).await?;
        decode_events(block).await
    }

    async fn timestamp_of(&self, hash: &BlockHash) -> ChainResult<u64> {
        let fetched = self.fetched(hash)?;
        let extrinsics = self.extrinsics(&fetched, hash).await?;
        timestamp_from_extrinsics(extrinsics).ok_or_else(|| ChainError::Decode {
            block: hash.to_hex(),
            message: "no decodable Timestamp.set inherent".into(),
        })
    }
}

// =============================================================================
// Block decoding helpers
// =============================================================================

fn decode_failure(block: &SubstrateBlock, message: impl ToString) -> ChainError {
    ChainError::Decode {
        block: block.number().to_string(),
        message: message.to_string(),
    }
}

/// Decode events from a block.
///
/// An event the runtime metadata cannot decode fails the whole block.
async fn decode_events(block: &SubstrateBlock) -> ChainResult<Vec<RawEvent>> {
    let events = block
        .events()
        .await
        .map_err(|e| ChainError::Rpc(e.to_string()))?;

    let mut raw_events = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let ev = event.map_err(|e| decode_failure(block, e))?;
        let data = ev
            .field_values()
            .map(|composite| fields_to_args(&composite))
            .map_err(|e| decode_failure(block, e))?;

        let phase = match ev.phase() {
            Phase::ApplyExtrinsic(idx) => Some(idx),
            _ => None,
        };

        raw_events.push(RawEvent {
            index: index as u32,
            phase,
            pallet: ev.pallet_name().to_string(),
            method: ev.variant_name().to_string(),
            data,
        });
    }

    trace!(block = block.number(), count = raw_events.len(), "Decoded events");
    Ok(raw_events)
}

/// Decode extrinsics from a block.
async fn decode_extrinsics(block: &SubstrateBlock) -> ChainResult<Vec<RawExtrinsic>> {
    let extrinsics = block
        .extrinsics()
        .await
        .map_err(|e| ChainError::Rpc(e.to_string()))?;

    let mut raw_extrinsics = Vec::new();

    for ext in extrinsics.iter() {
        let pallet = ext.pallet_name().map_err(|e| decode_failure(block, e))?;
        let method = ext.variant_name().map_err(|e| decode_failure(block, e))?;
        let args = ext
            .field_values()
            .map(|composite| fields_to_args(&composite))
            .map_err(|e| decode_failure(block, e))?;

        let signer = ext.address_bytes().and_then(signer_address);
        if ext.is_signed() && signer.is_none() {
            trace!(index = ext.index(), "Unsupported signer address format");
        }

        raw_extrinsics.push(RawExtrinsic {
            index: ext.index(),
            hash: format!("0x{}", hex::encode(ext.hash().0)),
            pallet: pallet.to_string(),
            method: method.to_string(),
            signer,
            args,
        });
    }

    Ok(raw_extrinsics)
}

/// SS58 address of a signer from its encoded `MultiAddress`.
fn signer_address(bytes: &[u8]) -> Option<String> {
    let account = match bytes {
        // MultiAddress::Id
        [0, rest @ ..] if rest.len() == 32 => rest,
        raw if raw.len() == 32 => raw,
        _ => return None,
    };
    <[u8; 32]>::try_from(account).ok().map(ss58)
}

/// Block timestamp from the decoded `Timestamp.set` inherent.
fn timestamp_from_extrinsics(extrinsics: &[RawExtrinsic]) -> Option<u64> {
    extrinsics
        .iter()
        .find(|ext| ext.pallet == "Timestamp" && ext.method == "set")
        .and_then(|ext| ext.args.first())
        .and_then(parse_moment)
}

fn parse_moment(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
