//! Metrics definitions for the history engine.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`. When no recorder is
//! installed every call here is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "history_cache_hits_total",
        "History requests answered from a fresh cache entry"
    );
    describe_counter!(
        "history_cache_misses_total",
        "History requests that required a chain scan"
    );
    describe_counter!(
        "cache_io_errors_total",
        "Cache storage errors swallowed by the cache layer"
    );
    describe_counter!(
        "blocks_scanned_total",
        "Total number of blocks successfully scanned"
    );
    describe_counter!(
        "block_scan_failures_total",
        "Total number of blocks skipped because they failed to load or decode"
    );
    describe_counter!(
        "decode_errors_total",
        "Total number of call or event decode errors"
    );
    describe_histogram!(
        "history_scan_duration_seconds",
        "Time taken to scan the chain for one account in seconds"
    );
}

/// Record a request answered from cache.
pub fn record_cache_hit() {
    counter!("history_cache_hits_total").increment(1);
}

/// Record a request that missed the cache.
pub fn record_cache_miss() {
    counter!("history_cache_misses_total").increment(1);
}

/// Record a swallowed cache storage error.
///
/// # Arguments
/// * `op` - The cache operation ("read", "write" or "clear")
pub fn record_cache_io_error(op: &'static str) {
    counter!("cache_io_errors_total", "op" => op).increment(1);
}

/// Record a successfully scanned block.
pub fn record_block_scanned() {
    counter!("blocks_scanned_total").increment(1);
}

/// Record a skipped block.
///
/// # Arguments
/// * `reason` - "chain_unavailable" or "decode"
pub fn record_block_failure(reason: &'static str) {
    counter!("block_scan_failures_total", "reason" => reason).increment(1);
}

/// Record a decode error.
///
/// # Arguments
/// * `kind` - What failed to decode ("call" or "event")
pub fn record_decode_error(kind: &'static str) {
    counter!("decode_errors_total", "kind" => kind).increment(1);
}

/// Record scan duration.
pub fn record_scan_duration(duration_secs: f64) {
    histogram!("history_scan_duration_seconds").record(duration_secs);
}

/// A timer that automatically records scan duration when dropped.
pub struct ScanTimer {
    start: Instant,
}

impl ScanTimer {
    /// Start a new scan timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ScanTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScanTimer {
    fn drop(&mut self) {
        record_scan_duration(self.start.elapsed().as_secs_f64());
    }
}
