//! # Domain Errors
//!
//! Malformed-input and configuration errors for the segment model.
//!
//! Verification failures are never errors here: predicates and the state
//! engine report them as `false` or an empty result.

use shared_crypto::CryptoError;
use shared_types::{Address, DecodeError};
use thiserror::Error;

/// Segment state error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentStateError {
    /// Segment with `end <= start`.
    #[error("Empty segment: [{start}, {end})")]
    EmptySegment {
        /// Range start
        start: u64,
        /// Range end
        end: u64,
    },

    /// Segment end beyond the per-token capacity.
    #[error("Segment end {end} exceeds token capacity")]
    SegmentOutOfRange {
        /// Offending end
        end: u64,
    },

    /// Token id beyond the supported token count.
    #[error("Token id out of range: {0}")]
    TokenOutOfRange(u64),

    /// `add` called on segments that do not share a boundary.
    #[error("segments are not neighbor")]
    NotNeighbor,

    /// Predicate name was never registered.
    #[error("unknown predicate name: {0}")]
    UnknownPredicateName(String),

    /// Predicate address was never registered.
    #[error("unknown predicate: {0:?}")]
    UnknownPredicate(Address),

    /// Predicate state bytes do not match the predicate's layout.
    #[error("Invalid predicate state: {0}")]
    InvalidState(String),

    /// Witness bytes are not a whole number of signatures.
    #[error("Invalid witness length: {0}")]
    InvalidWitness(usize),

    /// No output of the transaction starts at the given offset.
    #[error("No output starts at {start} in token {token_id}")]
    OutputNotFound {
        /// Token id searched
        token_id: u64,
        /// Start offset searched
        start: u64,
    },

    /// No exitable range covers the requested interval.
    #[error("exitable ranges not found: token {token_id} [{start}, {end})")]
    ExitableRangeNotFound {
        /// Token id
        token_id: u64,
        /// Range start
        start: u64,
        /// Range end
        end: u64,
    },

    /// More than one exitable range covers the requested interval.
    #[error("Ambiguous exitable range: {count} ranges cover token {token_id} [{start}, {end})")]
    AmbiguousExitableRange {
        /// Token id
        token_id: u64,
        /// Range start
        start: u64,
        /// Range end
        end: u64,
        /// Number of covering ranges
        count: usize,
    },

    /// Byte-level decoding failed.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Signature handling failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rlp::DecoderError> for SegmentStateError {
    fn from(e: rlp::DecoderError) -> Self {
        SegmentStateError::Decode(DecodeError::Rlp(e.to_string()))
    }
}

impl From<serde_json::Error> for SegmentStateError {
    fn from(e: serde_json::Error) -> Self {
        SegmentStateError::Serialization(e.to_string())
    }
}
