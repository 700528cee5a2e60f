//! Fakes shared by the schema and server tests.

use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::error::{ChainError, ChainResult};
use chronicle_core::models::BlockHash;
use chronicle_core::ports::{
    CacheStore, ChainGateway, RawEvent, RawExtrinsic, RuleRegistry, SystemClock,
};
use chronicle_core::services::{
    BlockScanner, Classifier, ClassifierConfig, HistoryCache, HistoryConfig, HistoryService,
    ScanConfig,
};

/// Nœud injoignable : seul le cache peut répondre.
pub(crate) struct OfflineChain;

#[async_trait]
impl ChainGateway for OfflineChain {
    async fn current_height(&self) -> ChainResult<u64> {
        Err(ChainError::ConnectionFailed("node offline".into()))
    }
    async fn block_hash(&self, height: u64) -> ChainResult<BlockHash> {
        Err(ChainError::BlockNotFound(height))
    }
    async fn extrinsics_of(&self, _: &BlockHash) -> ChainResult<Vec<RawExtrinsic>> {
        Ok(vec![])
    }
    async fn events_of(&self, _: &BlockHash) -> ChainResult<Vec<RawEvent>> {
        Ok(vec![])
    }
    async fn timestamp_of(&self, _: &BlockHash) -> ChainResult<u64> {
        Ok(0)
    }
}

/// History service over [`OfflineChain`] and the given store.
pub(crate) fn offline_service(store: Arc<dyn CacheStore>) -> Arc<HistoryService> {
    let classifier = Classifier::new(Arc::new(RuleRegistry::new()), ClassifierConfig::default());
    let scanner = BlockScanner::new(
        Arc::new(OfflineChain),
        Arc::new(classifier),
        ScanConfig::default(),
    );
    Arc::new(HistoryService::new(
        scanner,
        HistoryCache::new(store),
        Arc::new(SystemClock),
        HistoryConfig::default(),
    ))
}
