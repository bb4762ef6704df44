//! # Error Types
//!
//! Decoding errors shared by every crate that parses hex, words or RLP.

use thiserror::Error;

/// Errors raised while decoding byte-level representations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input was not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Input had an unexpected length.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// RLP payload could not be decoded.
    #[error("RLP decode failed: {0}")]
    Rlp(String),

    /// A numeric field did not fit its target type.
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}
