//! Block range scanner - walks blocks newest first and classifies them.
//!
//! Blocks are fetched through an ordered, bounded pipeline and consumed in
//! descending height order. Early termination is checked after each
//! consumed block, so with `concurrency > 1` a few blocks past the limit may
//! already be in flight when the scan stops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::error::{BlockError, ChainError, ChainResult, HistoryError, HistoryResult};
use crate::metrics::{ScanTimer, record_block_failure, record_block_scanned, record_decode_error};
use crate::models::{ChainEvent, Transaction, extrinsic_succeeded};
use crate::ports::{ChainGateway, RawEvent, RawExtrinsic};
use crate::services::classifier::{Classifier, ExtrinsicContext};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the block scanner.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Upper bound for every gateway call.
    pub call_timeout: Duration,
    /// Blocks fetched ahead of the one being consumed. 1 is strictly sequential.
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            concurrency: 1,
        }
    }
}

/// Inclusive block range plus a result-count limit for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub from_block: u64,
    pub to_block: u64,
    pub limit: usize,
}

impl ScanWindow {
    /// The `lookback` blocks below `tip`, and `tip` itself.
    pub fn ending_at(tip: u64, lookback: u64, limit: usize) -> Self {
        Self {
            from_block: tip.saturating_sub(lookback),
            to_block: tip,
            limit,
        }
    }
}

/// Outcome of a completed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Sorted newest first. May exceed the window limit by one block's worth.
    pub transactions: Vec<Transaction>,
    /// Newest block of the window.
    pub last_block_scanned: u64,
    pub blocks_scanned: u64,
    pub blocks_failed: u64,
}

// =============================================================================
// BlockScanner
// =============================================================================

/// Reverse-chronological block scanner.
#[derive(Clone)]
pub struct BlockScanner {
    gateway: Arc<dyn ChainGateway>,
    classifier: Arc<Classifier>,
    config: ScanConfig,
}

impl BlockScanner {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        classifier: Arc<Classifier>,
        config: ScanConfig,
    ) -> Self {
        Self {
            gateway,
            classifier,
            config,
        }
    }

    /// Current chain height, with the call timeout applied.
    pub async fn current_height(&self) -> HistoryResult<u64> {
        Ok(self
            .bounded("current_height", self.gateway.current_height())
            .await?)
    }

    /// Scan `window` for transactions involving `account`.
    ///
    /// Per-block failures are logged and skipped. A chain-level failure on
    /// the newest block is returned as [`HistoryError::ChainUnavailable`].
    #[instrument(
        skip_all,
        fields(account = %account, from = window.from_block, to = window.to_block)
    )]
    pub async fn scan(
        &self,
        account: &str,
        window: ScanWindow,
        cancel: &CancellationToken,
    ) -> HistoryResult<ScanReport> {
        let _timer = ScanTimer::new();
        let mut report = ScanReport {
            last_block_scanned: window.to_block,
            ..Default::default()
        };

        if cancel.is_cancelled() {
            return Err(HistoryError::Cancelled);
        }
        if window.limit == 0 || window.from_block > window.to_block {
            return Ok(report);
        }

        let mut blocks = std::pin::pin!(
            futures::stream::iter((window.from_block..=window.to_block).rev())
                .map(|height| async move { (height, self.scan_block(height, account).await) })
                .buffered(self.config.concurrency.max(1))
        );

        let mut first = true;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(collected = report.transactions.len(), "Scan cancelled");
                    return Err(HistoryError::Cancelled);
                }
                next = blocks.next() => next,
            };
            let Some((height, outcome)) = next else {
                break;
            };

            match outcome {
                Ok(mut found) => {
                    trace!(block = height, found = found.len(), "Block scanned");
                    record_block_scanned();
                    report.blocks_scanned += 1;
                    report.transactions.append(&mut found);
                }
                Err(BlockError::Chain { source, .. }) if first && source.is_unavailable() => {
                    warn!(block = height, error = %source, "⚠️  Chain unreachable at scan start");
                    return Err(HistoryError::ChainUnavailable(source));
                }
                Err(e) => {
                    warn!(block = height, reason = e.reason(), error = %e, "⚠️  Skipping block");
                    record_block_failure(e.reason());
                    report.blocks_failed += 1;
                }
            }
            first = false;

            if report.transactions.len() >= window.limit {
                debug!(block = height, "Result limit reached");
                break;
            }
        }

        sort_newest_first(&mut report.transactions);
        debug!(
            found = report.transactions.len(),
            scanned = report.blocks_scanned,
            failed = report.blocks_failed,
            "Scan complete"
        );
        Ok(report)
    }

    /// Fetch one block and classify its extrinsics.
    ///
    /// A decode failure fails the block only when the extrinsic involved
    /// references `account`.
    async fn scan_block(&self, height: u64, account: &str) -> Result<Vec<Transaction>, BlockError> {
        let chain = |source: ChainError| BlockError::Chain { height, source };

        let hash = self
            .bounded("block_hash", self.gateway.block_hash(height))
            .await
            .map_err(chain)?;
        let (extrinsics, raw_events, timestamp) = tokio::try_join!(
            self.bounded("extrinsics_of", self.gateway.extrinsics_of(&hash)),
            self.bounded("events_of", self.gateway.events_of(&hash)),
            self.bounded("timestamp_of", self.gateway.timestamp_of(&hash)),
        )
        .map_err(chain)?;

        // Initialization and finalization events belong to no extrinsic
        let mut by_phase: HashMap<u32, Vec<&RawEvent>> = HashMap::new();
        for raw in &raw_events {
            if let Some(phase) = raw.phase {
                by_phase.entry(phase).or_default().push(raw);
            }
        }

        let mut found = Vec::new();
        for extrinsic in &extrinsics {
            let raw_own = by_phase
                .get(&extrinsic.index)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let classified = raw_own
                .iter()
                .map(|raw| ChainEvent::decode(raw))
                .collect::<Result<Vec<_>, _>>()
                .inspect_err(|_| record_decode_error("event"))
                .and_then(|own| {
                    let ctx = ExtrinsicContext {
                        extrinsic,
                        events: &own,
                        block_number: height,
                        timestamp,
                        succeeded: extrinsic_succeeded(&own),
                    };
                    self.classifier
                        .classify(&ctx, account)
                        .inspect_err(|_| record_decode_error("call"))
                });

            match classified {
                Ok(tx) => found.extend(tx),
                Err(source) if mentions(extrinsic, raw_own, account) => {
                    return Err(BlockError::Decode { height, source });
                }
                Err(source) => {
                    trace!(
                        block = height,
                        index = extrinsic.index,
                        error = %source,
                        "Skipping undecodable extrinsic of another account"
                    );
                }
            }
        }

        Ok(found)
    }

    /// Apply the call timeout to a gateway future.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = ChainResult<T>>,
    ) -> ChainResult<T> {
        let limit = self.config.call_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Timeout {
                operation,
                after_ms: limit.as_millis() as u64,
            }),
        }
    }
}

/// Whether the account appears as signer, in the call arguments or in the
/// extrinsic's own events.
fn mentions(extrinsic: &RawExtrinsic, events: &[&RawEvent], account: &str) -> bool {
    extrinsic.signer.as_deref() == Some(account)
        || extrinsic.args.iter().any(|v| value_mentions(v, account))
        || events
            .iter()
            .flat_map(|e| e.data.iter())
            .any(|v| value_mentions(v, account))
}

fn value_mentions(value: &serde_json::Value, account: &str) -> bool {
    match value {
        serde_json::Value::String(s) => s.trim() == account,
        serde_json::Value::Array(items) => items.iter().any(|v| value_mentions(v, account)),
        serde_json::Value::Object(fields) => fields.values().any(|v| value_mentions(v, account)),
        _ => false,
    }
}

/// Descending timestamp, ties broken by descending block number.
///
/// The sort is stable, so extrinsics of one block keep their block order.
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.block_number.cmp(&a.block_number))
    });
}
