//! In-memory fakes shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{CacheError, CacheResult, ChainError, ChainResult, DecodeError, DecodeResult};
use crate::models::{Asset, BlockHash, CacheEntry, ChainEvent, TransactionKind};
use crate::ports::{
    CacheStore, CallSummary, ChainGateway, Clock, PalletRule, RawEvent, RawExtrinsic, RuleRegistry,
};

// =============================================================================
// Rules
// =============================================================================

/// `payments.pay(dest, value)` transfer rule.
pub(crate) struct PayRule;

impl PalletRule for PayRule {
    fn pallet_name(&self) -> &'static str {
        "payments"
    }

    fn summarize(
        &self,
        ext: &RawExtrinsic,
        _events: &[ChainEvent],
    ) -> DecodeResult<Option<CallSummary>> {
        if ext.method != "pay" {
            return Ok(None);
        }
        let invalid = |index| DecodeError::InvalidArgument {
            pallet: ext.pallet.clone(),
            method: ext.method.clone(),
            index,
            expected: "pay argument",
        };
        let to = ext.args.first().and_then(|v| v.as_str()).ok_or_else(|| invalid(0))?;
        let amount = ext.args.get(1).and_then(|v| v.as_u64()).ok_or_else(|| invalid(1))?;
        Ok(Some(CallSummary {
            kind: TransactionKind::Transfer,
            from: ext.signer.clone().unwrap_or_default(),
            to: to.to_string(),
            amount: amount as u128,
            asset: Asset::Dalla,
            description: format!("Payment to {}", to),
        }))
    }
}

pub(crate) fn pay_registry() -> RuleRegistry {
    let mut rules = RuleRegistry::new();
    rules.register(std::sync::Arc::new(PayRule));
    rules
}

// =============================================================================
// Chain
// =============================================================================

#[derive(Default, Clone)]
struct FakeBlock {
    extrinsics: Vec<RawExtrinsic>,
    events: Vec<RawEvent>,
}

/// Block-to-hash mapping: the height lives in the first 8 bytes.
pub(crate) fn hash_of(height: u64) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    BlockHash(bytes)
}

fn height_of(hash: &BlockHash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.0[..8]);
    u64::from_be_bytes(bytes)
}

/// Scripted chain. Block `n` has timestamp `n * 6000` unless overridden.
#[derive(Default)]
pub(crate) struct FakeChain {
    tip: u64,
    blocks: HashMap<u64, FakeBlock>,
    timestamps: HashMap<u64, u64>,
    undecodable: HashSet<u64>,
    unreachable_blocks: HashSet<u64>,
    unreachable: bool,
    delay: Option<Duration>,
    height_calls: AtomicUsize,
    extrinsic_calls: AtomicUsize,
}

impl FakeChain {
    pub(crate) fn new(tip: u64) -> Self {
        Self {
            tip,
            ..Default::default()
        }
    }

    /// Add a successful `payments.pay` extrinsic to a block.
    pub(crate) fn with_payment(mut self, height: u64, from: &str, to: &str, amount: u64) -> Self {
        let block = self.blocks.entry(height).or_default();
        let index = block.extrinsics.len() as u32;
        block.extrinsics.push(RawExtrinsic {
            index,
            hash: format!("0x{:06x}{:02x}", height, index),
            pallet: "Payments".into(),
            method: "pay".into(),
            signer: Some(from.into()),
            args: vec![json!(to), json!(amount)],
        });
        block.events.push(RawEvent {
            index: block.events.len() as u32,
            phase: Some(index),
            pallet: "System".into(),
            method: "ExtrinsicSuccess".into(),
            data: vec![],
        });
        self
    }

    /// Attach an event to a block, to an extrinsic when `phase` is set.
    pub(crate) fn with_event(
        mut self,
        height: u64,
        phase: Option<u32>,
        pallet: &str,
        method: &str,
        data: Vec<serde_json::Value>,
    ) -> Self {
        let block = self.blocks.entry(height).or_default();
        block.events.push(RawEvent {
            index: block.events.len() as u32,
            phase,
            pallet: pallet.into(),
            method: method.into(),
            data,
        });
        self
    }

    pub(crate) fn with_timestamp(mut self, height: u64, timestamp: u64) -> Self {
        self.timestamps.insert(height, timestamp);
        self
    }

    /// Make a block's body fail to decode.
    pub(crate) fn undecodable(mut self, height: u64) -> Self {
        self.undecodable.insert(height);
        self
    }

    /// Make every call for a block fail as if the node went away.
    pub(crate) fn unreachable_at(mut self, height: u64) -> Self {
        self.unreachable_blocks.insert(height);
        self
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn height_calls(&self) -> usize {
        self.height_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn extrinsic_calls(&self) -> usize {
        self.extrinsic_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_reachable(&self, height: u64) -> ChainResult<()> {
        if self.unreachable || self.unreachable_blocks.contains(&height) {
            return Err(ChainError::ConnectionFailed("node unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainGateway for FakeChain {
    async fn current_height(&self) -> ChainResult<u64> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(ChainError::ConnectionFailed("node unreachable".into()));
        }
        Ok(self.tip)
    }

    async fn block_hash(&self, height: u64) -> ChainResult<BlockHash> {
        self.pause().await;
        self.check_reachable(height)?;
        if height > self.tip {
            return Err(ChainError::BlockNotFound(height));
        }
        Ok(hash_of(height))
    }

    async fn extrinsics_of(&self, block: &BlockHash) -> ChainResult<Vec<RawExtrinsic>> {
        self.extrinsic_calls.fetch_add(1, Ordering::SeqCst);
        let height = height_of(block);
        self.check_reachable(height)?;
        if self.undecodable.contains(&height) {
            return Err(ChainError::Decode {
                block: block.to_hex(),
                message: "unexpected extrinsic encoding".into(),
            });
        }
        Ok(self
            .blocks
            .get(&height)
            .map(|b| b.extrinsics.clone())
            .unwrap_or_default())
    }

    async fn events_of(&self, block: &BlockHash) -> ChainResult<Vec<RawEvent>> {
        let height = height_of(block);
        self.check_reachable(height)?;
        Ok(self
            .blocks
            .get(&height)
            .map(|b| b.events.clone())
            .unwrap_or_default())
    }

    async fn timestamp_of(&self, block: &BlockHash) -> ChainResult<u64> {
        let height = height_of(block);
        self.check_reachable(height)?;
        Ok(self
            .timestamps
            .get(&height)
            .copied()
            .unwrap_or(height * 6_000))
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Clock that only moves when told to.
#[derive(Default)]
pub(crate) struct ManualClock(AtomicU64);

impl ManualClock {
    pub(crate) fn at(ms: u64) -> Self {
        Self(AtomicU64::new(ms))
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Cache store
// =============================================================================

/// Store that fails every operation.
pub(crate) struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn read(
        &self,
        _account_address: &str,
    ) -> CacheResult<Option<CacheEntry>> {
        Err(CacheError::Unavailable("quota exceeded".into()))
    }

    async fn write(
        &self,
        _account_address: &str,
        _entry: &CacheEntry,
    ) -> CacheResult<()> {
        Err(CacheError::Io("quota exceeded".into()))
    }

    async fn clear(&self, _account_address: Option<&str>) -> CacheResult<()> {
        Err(CacheError::Io("quota exceeded".into()))
    }
}

/// Plain map store, so core tests do not depend on an adapter crate.
#[derive(Default)]
pub(crate) struct MapStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
    writes: AtomicUsize,
}

impl MapStore {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn get(&self, account: &str) -> Option<CacheEntry> {
        self.entries.lock().unwrap().get(account).cloned()
    }
}

#[async_trait]
impl CacheStore for MapStore {
    async fn read(
        &self,
        account_address: &str,
    ) -> CacheResult<Option<CacheEntry>> {
        Ok(self.get(account_address))
    }

    async fn write(
        &self,
        account_address: &str,
        entry: &CacheEntry,
    ) -> CacheResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(account_address.to_string(), entry.clone());
        Ok(())
    }

    async fn clear(&self, account_address: Option<&str>) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap();
        match account_address {
            Some(account) => {
                entries.remove(account);
            }
            None => entries.clear(),
        }
        Ok(())
    }
}
