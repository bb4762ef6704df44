//! # Domain Errors
//!
//! Error types for segment history and wallet tracking.
//!
//! History failures come in two classes: recoverable ones trigger a refetch
//! from the chain, structural ones abort the walk (see
//! [`HistoryError::is_structural`]).

use pc_01_segment_state::SegmentStateError;
use pc_02_sum_merkle::BlockError;
use thiserror::Error;

/// Proof store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A store lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// A stored record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Chain client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainClientError {
    /// The chain has no such block.
    #[error("Block not found: {0}")]
    NotFound(u64),

    /// The request did not complete.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Segment history errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// `verify_history` on a key that was never registered.
    #[error("Unknown history key: {0}")]
    UnknownKey(String),

    /// No segmented block stored for (key, block).
    #[error("Missing proof for {key} at block {blk_num}")]
    MissingProof {
        /// History key
        key: String,
        /// Block number
        blk_num: u64,
    },

    /// A stored proof did not check against the header root.
    #[error("Proof check failed at block {blk_num}: {reason}")]
    ProofCheckFailed {
        /// Block number
        blk_num: u64,
        /// Which check failed
        reason: String,
    },

    /// The recorded transitions are inconsistent. Fatal.
    #[error("Invalid history at block {blk_num}: {reason}")]
    InvalidHistory {
        /// Block number
        blk_num: u64,
        /// What was inconsistent
        reason: String,
    },

    /// A header or proof record could not be decoded.
    #[error("Corrupted record: {0}")]
    CorruptedRecord(String),

    /// Proof store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl HistoryError {
    /// Structural errors end the walk; everything else may be retried.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HistoryError::InvalidHistory { .. } | HistoryError::UnknownKey(_) | HistoryError::Store(_)
        )
    }
}

/// Wallet tracker errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Malformed segment or predicate data in an event.
    #[error("Segment error: {0}")]
    Segment(#[from] SegmentStateError),

    /// The received block could not produce proofs.
    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    /// History bookkeeping failed.
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Proof store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
