//! # Domain Errors
//!
//! Structural failures of block commitments. Proof verification failures are
//! reported as `false`, never as errors.

use pc_01_segment_state::SegmentStateError;
use thiserror::Error;

/// Block and proof error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    /// Two outputs of the same token overlap.
    #[error("segment duplicated: token {token_id} output at {start} overlaps previous end {prev_end}")]
    OverlappingSegments {
        /// Token id
        token_id: u64,
        /// Start of the offending output
        start: u64,
        /// End of the preceding leaf
        prev_end: u64,
    },

    /// `numTokens` outside `1..=MAX_TOKENS`.
    #[error("Invalid token count: {0}")]
    InvalidTokenCount(u64),

    /// Super root requested before the block was sealed.
    #[error("Super root not set")]
    SuperRootNotSet,

    /// No transaction with the given hash in the block.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// A proof was requested for a leaf the tree does not have.
    #[error("Leaf index out of range: {index} (leaves: {len})")]
    LeafOutOfRange {
        /// Requested index
        index: usize,
        /// Number of leaves
        len: usize,
    },

    /// A value does not fit its 2-byte field in the on-chain proof encoding.
    #[error("{field} does not fit in 2 bytes: {value}")]
    FieldOverflow {
        /// Field name
        field: &'static str,
        /// Offending value
        value: usize,
    },

    /// Segment model error.
    #[error("Segment error: {0}")]
    Segment(#[from] SegmentStateError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BlockError {
    fn from(e: serde_json::Error) -> Self {
        BlockError::Serialization(e.to_string())
    }
}

impl From<shared_types::DecodeError> for BlockError {
    fn from(e: shared_types::DecodeError) -> Self {
        BlockError::Segment(SegmentStateError::Decode(e))
    }
}
