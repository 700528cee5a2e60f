//! History facade - the public entry point for account history.
//!
//! # Flow
//!
//! 1. Serve a fresh cache entry if one exists
//! 2. Otherwise join the in-flight scan for the account, or start one
//! 3. Write the full, unfiltered scan result to the cache
//! 4. Apply direction, asset and limit filters to a copy
//!
//! A shared scan keeps running while at least one caller is still waiting
//! on it. Once every caller has cancelled it is dropped between two
//! awaits and the cache is left untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::{HistoryError, HistoryResult};
use crate::metrics::{record_cache_hit, record_cache_miss};
use crate::models::{Asset, CacheEntry, Transaction, TransactionKind};
use crate::ports::Clock;
use crate::services::cache::HistoryCache;
use crate::services::scanner::{BlockScanner, ScanWindow};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the history facade.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Blocks below the chain tip covered by a scan.
    pub lookback: u64,
    /// Transactions kept per account.
    pub max_results: usize,
    /// How long a cache entry is served without rescanning.
    pub freshness: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            lookback: 10_000,
            max_results: 100,
            freshness: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Which side of a transaction the account must be on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    All,
    Sent,
    Received,
    Staking,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Direction::All),
            "sent" => Ok(Direction::Sent),
            "received" => Ok(Direction::Received),
            "staking" => Ok(Direction::Staking),
            other => Err(format!(
                "Unknown direction '{}'. Use 'all', 'sent', 'received' or 'staking'.",
                other
            )),
        }
    }
}

/// Post-scan filters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub direction: Direction,
    pub asset: Option<Asset>,
    pub limit: Option<usize>,
}

impl HistoryFilter {
    /// Filter a base set without touching it: direction, then asset, then limit.
    pub fn apply(&self, account: &str, transactions: &[Transaction]) -> Vec<Transaction> {
        let matches_direction = |tx: &Transaction| match self.direction {
            Direction::All => true,
            Direction::Sent => tx.from == account,
            Direction::Received => tx.to == account,
            Direction::Staking => tx.kind == TransactionKind::Staking,
        };

        transactions
            .iter()
            .filter(|tx| matches_direction(tx))
            .filter(|tx| self.asset.is_none_or(|asset| tx.asset == asset))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

// =============================================================================
// Scan job
// =============================================================================

type ScanOutput = HistoryResult<Arc<Vec<Transaction>>>;
type SharedScan = Shared<BoxFuture<'static, ScanOutput>>;

/// Everything a detached scan needs, owned so it can outlive the caller.
#[derive(Clone)]
struct ScanJob {
    scanner: BlockScanner,
    cache: HistoryCache,
    clock: Arc<dyn Clock>,
    config: HistoryConfig,
}

impl ScanJob {
    async fn run(self, account: String) -> ScanOutput {
        let tip = self.scanner.current_height().await?;
        let window = ScanWindow::ending_at(tip, self.config.lookback, self.config.max_results);

        // Dropping this future is how cancellation reaches the scan.
        let mut report = self
            .scanner
            .scan(&account, window, &CancellationToken::new())
            .await?;
        report.transactions.truncate(self.config.max_results);

        info!(
            account = %account,
            transactions = report.transactions.len(),
            blocks = report.blocks_scanned,
            failed = report.blocks_failed,
            "📜 History scanned"
        );

        let entry = CacheEntry {
            account_address: account.clone(),
            last_block_scanned: report.last_block_scanned,
            transactions: report.transactions,
            written_at: self.clock.now_ms(),
        };
        self.cache.write(&account, &entry).await;

        Ok(Arc::new(entry.transactions))
    }
}

// =============================================================================
// HistoryService
// =============================================================================

/// Account history facade with caching and request coalescing.
pub struct HistoryService {
    job: ScanJob,
    inflight: Mutex<HashMap<String, WeakShared<BoxFuture<'static, ScanOutput>>>>,
}

impl HistoryService {
    pub fn new(
        scanner: BlockScanner,
        cache: HistoryCache,
        clock: Arc<dyn Clock>,
        config: HistoryConfig,
    ) -> Self {
        Self {
            job: ScanJob {
                scanner,
                cache,
                clock,
                config,
            },
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.job.config
    }

    /// Transaction history of an account, newest first.
    ///
    /// Returns [`HistoryError::Cancelled`] once `cancel` fires, and
    /// [`HistoryError::ChainUnavailable`] when the chain cannot be reached
    /// at the start of a scan.
    #[instrument(skip_all, fields(account = %account_address))]
    pub async fn get_account_history(
        &self,
        account_address: &str,
        filter: &HistoryFilter,
        cancel: &CancellationToken,
    ) -> HistoryResult<Vec<Transaction>> {
        let account = account_address.trim();
        if account.is_empty() {
            return Err(HistoryError::InvalidAddress(account_address.to_string()));
        }
        if cancel.is_cancelled() {
            return Err(HistoryError::Cancelled);
        }

        let freshness_ms = self.job.config.freshness.as_millis() as u64;
        if let Some(entry) = self.job.cache.read(account).await
            && entry.account_address == account
            && entry.is_fresh(self.job.clock.now_ms(), freshness_ms)
        {
            debug!(cached = entry.transactions.len(), "Serving cached history");
            record_cache_hit();
            return Ok(filter.apply(account, &entry.transactions));
        }
        record_cache_miss();

        let scan = self.join_or_start(account);
        let transactions = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("History request cancelled");
                return Err(HistoryError::Cancelled);
            }
            result = scan => result?,
        };

        Ok(filter.apply(account, &transactions))
    }

    /// Drop one account's cached history, or everyone's.
    pub async fn clear_cache(&self, account_address: Option<&str>) {
        let account = account_address.map(str::trim).filter(|a| !a.is_empty());
        self.job.cache.clear(account).await;
        info!(account = ?account, "🧹 History cache cleared");
    }

    /// Join the live scan for `account`, or start a new one.
    fn join_or_start(&self, account: &str) -> SharedScan {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(scan) = inflight.get(account).and_then(WeakShared::upgrade) {
            debug!("Joining in-flight scan");
            return scan;
        }

        inflight.retain(|_, weak| weak.upgrade().is_some());
        let scan = self.job.clone().run(account.to_string()).boxed().shared();
        if let Some(weak) = scan.downgrade() {
            inflight.insert(account.to_string(), weak);
        }
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionStatus;
    use crate::ports::CacheStore;
    use crate::services::classifier::{Classifier, ClassifierConfig};
    use crate::services::scanner::ScanConfig;
    use crate::services::testing::{BrokenStore, FakeChain, ManualClock, MapStore, pay_registry};

    struct Harness {
        chain: Arc<FakeChain>,
        store: Arc<MapStore>,
        clock: Arc<ManualClock>,
        service: HistoryService,
    }

    fn harness_with(chain: FakeChain, store: Arc<dyn CacheStore>, map: Arc<MapStore>) -> Harness {
        let chain = Arc::new(chain);
        let clock = Arc::new(ManualClock::at(1_000_000));
        let classifier = Classifier::new(Arc::new(pay_registry()), ClassifierConfig::default());
        let scanner = BlockScanner::new(chain.clone(), Arc::new(classifier), ScanConfig::default());
        let config = HistoryConfig {
            lookback: 10,
            ..Default::default()
        };
        let service = HistoryService::new(scanner, HistoryCache::new(store), clock.clone(), config);
        Harness {
            chain,
            store: map,
            clock,
            service,
        }
    }

    fn harness(chain: FakeChain) -> Harness {
        let store = Arc::new(MapStore::default());
        harness_with(chain, store.clone(), store)
    }

    /// Alice envoie à Bob sur les blocs pairs, reçoit de Bob sur les impairs.
    fn alice_and_bob() -> FakeChain {
        (100..=110).fold(FakeChain::new(110), |chain, height| {
            if height % 2 == 0 {
                chain.with_payment(height, "Alice", "Bob", 1_000)
            } else {
                chain.with_payment(height, "Bob", "Alice", 2_000)
            }
        })
    }

    fn tx(from: &str, to: &str, kind: TransactionKind, asset: Asset) -> Transaction {
        Transaction {
            hash: "0x00".into(),
            block_number: 1,
            timestamp: 1,
            kind,
            from: from.into(),
            to: to.into(),
            amount: "1.00".into(),
            asset,
            status: TransactionStatus::Success,
            fee: "0".into(),
            metadata: None,
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    #[test]
    fn test_filter_direction_asset_and_limit() {
        let base = vec![
            tx("Alice", "Bob", TransactionKind::Transfer, Asset::Dalla),
            tx("Bob", "Alice", TransactionKind::Transfer, Asset::BBzd),
            tx("Alice", "Staking", TransactionKind::Staking, Asset::Dalla),
            tx("Carol", "Alice", TransactionKind::Transfer, Asset::Dalla),
        ];

        let sent = HistoryFilter {
            direction: Direction::Sent,
            ..Default::default()
        };
        assert_eq!(sent.apply("Alice", &base).len(), 2);

        let received_dalla = HistoryFilter {
            direction: Direction::Received,
            asset: Some(Asset::Dalla),
            limit: None,
        };
        let result = received_dalla.apply("Alice", &base);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].from, "Carol");

        let staking = HistoryFilter {
            direction: Direction::Staking,
            ..Default::default()
        };
        assert_eq!(staking.apply("Alice", &base)[0].to, "Staking");

        let limited = HistoryFilter {
            limit: Some(3),
            ..Default::default()
        };
        assert_eq!(limited.apply("Alice", &base).len(), 3);
        assert_eq!(base.len(), 4);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("Sent".parse::<Direction>().unwrap(), Direction::Sent);
        assert!("outbound".parse::<Direction>().is_err());
    }

    // =========================================================================
    // Facade
    // =========================================================================

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let h = harness(alice_and_bob());
        let filter = HistoryFilter::default();
        let cancel = CancellationToken::new();

        let first = h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        let second = h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();

        assert_eq!(first.len(), 11);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(h.chain.height_calls(), 1);
        assert_eq!(h.chain.extrinsic_calls(), 11);
    }

    #[tokio::test]
    async fn test_cache_expires_after_freshness_window() {
        let h = harness(alice_and_bob());
        let filter = HistoryFilter::default();
        let cancel = CancellationToken::new();

        h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();

        h.clock.advance(Duration::from_secs(29));
        h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        assert_eq!(h.chain.height_calls(), 1);

        h.clock.advance(Duration::from_secs(2));
        h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        assert_eq!(h.chain.height_calls(), 2);
        assert_eq!(h.store.writes(), 2);
    }

    #[tokio::test]
    async fn test_cache_holds_unfiltered_result() {
        let h = harness(alice_and_bob());
        let filter = HistoryFilter {
            direction: Direction::Sent,
            asset: None,
            limit: Some(2),
        };

        let result = h
            .service
            .get_account_history("Alice", &filter, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|t| t.from == "Alice"));

        let entry = h.store.get("Alice").unwrap();
        assert_eq!(entry.transactions.len(), 11);
        assert_eq!(entry.last_block_scanned, 110);
        assert_eq!(entry.written_at, 1_000_000);
    }

    #[tokio::test]
    async fn test_chain_unavailable_is_surfaced_and_not_cached() {
        let h = harness(alice_and_bob().unreachable());
        let err = h
            .service
            .get_account_history("Alice", &HistoryFilter::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HistoryError::ChainUnavailable(_)));
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_empty_address_is_rejected() {
        let h = harness(alice_and_bob());
        let err = h
            .service
            .get_account_history("  ", &HistoryFilter::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::InvalidAddress(_)));
        assert_eq!(h.chain.height_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_request_never_writes_cache() {
        let h = harness(alice_and_bob().with_delay(Duration::from_millis(100)));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            trigger.cancel();
        });

        let err = h
            .service
            .get_account_history("Alice", &HistoryFilter::default(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, HistoryError::Cancelled));
        assert_eq!(h.store.writes(), 0);
        assert!(h.store.get("Alice").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_one_scan() {
        let h = harness(alice_and_bob().with_delay(Duration::from_millis(10)));
        let cancel = CancellationToken::new();
        let sent = HistoryFilter {
            direction: Direction::Sent,
            ..Default::default()
        };
        let all = HistoryFilter::default();

        let (a, b) = tokio::join!(
            h.service.get_account_history("Alice", &sent, &cancel),
            h.service.get_account_history("Alice", &all, &cancel),
        );

        assert_eq!(a.unwrap().len(), 6);
        assert_eq!(b.unwrap().len(), 11);
        assert_eq!(h.chain.height_calls(), 1);
        assert_eq!(h.store.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_survives_when_one_waiter_cancels() {
        let h = harness(alice_and_bob().with_delay(Duration::from_millis(100)));
        let impatient = CancellationToken::new();
        let patient = CancellationToken::new();
        let trigger = impatient.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            trigger.cancel();
        });

        let filter = HistoryFilter::default();
        let (a, b) = tokio::join!(
            h.service.get_account_history("Alice", &filter, &impatient),
            h.service.get_account_history("Alice", &filter, &patient),
        );

        assert!(matches!(a, Err(HistoryError::Cancelled)));
        assert_eq!(b.unwrap().len(), 11);
        assert_eq!(h.chain.height_calls(), 1);
        assert_eq!(h.store.writes(), 1);
    }

    #[tokio::test]
    async fn test_accounts_do_not_share_cache() {
        let h = harness(alice_and_bob().with_payment(105, "Carol", "Dave", 5));
        let cancel = CancellationToken::new();
        let filter = HistoryFilter::default();

        h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        let carol = h.service.get_account_history("Carol", &filter, &cancel).await.unwrap();

        assert_eq!(carol.len(), 1);
        assert_eq!(h.chain.height_calls(), 2);
        assert_eq!(h.store.get("Alice").unwrap().transactions.len(), 11);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_rescan() {
        let h = harness(alice_and_bob());
        let cancel = CancellationToken::new();
        let filter = HistoryFilter::default();

        h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        h.service.clear_cache(Some("Alice")).await;
        h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        assert_eq!(h.chain.height_calls(), 2);

        h.service.clear_cache(None).await;
        assert!(h.store.get("Alice").is_none());
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_scanning() {
        let unused = Arc::new(MapStore::default());
        let h = harness_with(alice_and_bob(), Arc::new(BrokenStore), unused);
        let cancel = CancellationToken::new();
        let filter = HistoryFilter::default();

        let first = h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();
        let second = h.service.get_account_history("Alice", &filter, &cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.chain.height_calls(), 2);
    }
}
