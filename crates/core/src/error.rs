//! Error types for the history engine.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ChainError`] - Chain Access Gateway errors (RPC, connectivity, timeouts)
//! - [`DecodeError`] - Fail-closed decoding of calls and events
//! - [`BlockError`] - Failure to process one block during a scan
//! - [`CacheError`] - Cache storage errors (never surfaced to callers)
//! - [`HistoryError`] - Errors crossing the history facade boundary
//!
//! Only [`HistoryError`] reaches callers of
//! [`crate::services::HistoryService`]. Everything else is recovered
//! locally: a failed block is skipped, a failed cache read is a miss.

use thiserror::Error;

// =============================================================================
// Chain Errors
// =============================================================================

/// Chain Access Gateway errors.
///
/// These errors occur when talking to the node, or when the node returns
/// data that cannot be decoded into raw extrinsics and events.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// WebSocket connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// RPC request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// No block exists at the requested height.
    #[error("Block not found at height {0}")]
    BlockNotFound(u64),

    /// Block data was fetched but could not be decoded.
    #[error("Decode error in block {block}: {message}")]
    Decode {
        /// Block hash or height the failure relates to.
        block: String,
        /// Error details.
        message: String,
    },

    /// A gateway call did not complete in time.
    #[error("Timeout after {after_ms}ms during {operation}")]
    Timeout {
        /// Gateway operation that timed out.
        operation: &'static str,
        /// Timeout that was applied.
        after_ms: u64,
    },
}

impl ChainError {
    /// Whether this error means the chain could not be reached, as opposed
    /// to the chain answering with undecodable data.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, ChainError::Decode { .. })
    }
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Shape mismatch while decoding a known pallet call or event.
///
/// Decoding fails closed: a recognised call whose arguments do not have
/// the expected shape is an error, never a zero-valued record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A positional argument is missing.
    #[error("{pallet}.{method}: missing argument {index}")]
    MissingArgument {
        pallet: String,
        method: String,
        index: usize,
    },

    /// A positional argument has the wrong type or format.
    #[error("{pallet}.{method}: invalid argument {index}: expected {expected}")]
    InvalidArgument {
        pallet: String,
        method: String,
        index: usize,
        expected: &'static str,
    },

    /// An extrinsic that needs a signer was unsigned.
    #[error("{pallet}.{method}: missing signer")]
    MissingSigner { pallet: String, method: String },

    /// A recognised event carries malformed data.
    #[error("event {pallet}.{method}: invalid field {index}: expected {expected}")]
    InvalidEventField {
        pallet: String,
        method: String,
        index: usize,
        expected: &'static str,
    },
}

// =============================================================================
// Block Errors
// =============================================================================

/// Failure to process a single block during a scan.
///
/// The scanner logs these and moves on to the next older block, except when
/// the very first block fails with an unavailable chain.
#[derive(Debug, Clone, Error)]
pub enum BlockError {
    /// A gateway call for this block failed.
    #[error("Chain error at block {height}: {source}")]
    Chain {
        height: u64,
        #[source]
        source: ChainError,
    },

    /// An extrinsic or event in this block failed to decode.
    #[error("Decode error at block {height}: {source}")]
    Decode {
        height: u64,
        #[source]
        source: DecodeError,
    },
}

impl BlockError {
    /// Label used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            BlockError::Chain { source, .. } if source.is_unavailable() => "chain_unavailable",
            BlockError::Chain { .. } | BlockError::Decode { .. } => "decode",
        }
    }

    /// Whether this failure means the chain could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BlockError::Chain { source, .. } if source.is_unavailable())
    }
}

// =============================================================================
// Cache Errors
// =============================================================================

/// Cache storage errors.
///
/// The cache is an optimisation: these never cross the facade boundary.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backing storage could not be read or written.
    #[error("Cache I/O error: {0}")]
    Io(String),

    /// Record could not be serialized.
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// Backing storage is not available at all.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// History Errors
// =============================================================================

/// Errors returned by the history facade.
///
/// `Clone` so that one in-flight scan can hand its result to every caller
/// coalesced onto it.
#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    /// The chain could not be reached for the newest block of the window.
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(#[from] ChainError),

    /// The caller withdrew interest before the scan completed.
    #[error("History request cancelled")]
    Cancelled,

    /// The account address was empty or malformed.
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for facade operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Result type for gateway operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for cache storage operations.
pub type CacheResult<T> = Result<T, CacheError>;
