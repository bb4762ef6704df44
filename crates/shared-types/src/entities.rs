//! # Core Primitives
//!
//! Aliases and protocol constants for the segment state engine.

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Per-token value capacity. Every token owns the range `[0, TOTAL_AMOUNT)`.
///
/// 2^48 keeps `token_id * TOTAL_AMOUNT + end` inside a `u64` for every
/// token id below [`MAX_TOKENS`].
pub const TOTAL_AMOUNT: u64 = 1 << 48;

/// Upper bound on the token count, and exclusive bound on token ids.
///
/// Proofs carry `numTokens` in 2 bytes, and the full tree weight
/// `MAX_TOKENS * TOTAL_AMOUNT` must stay below 2^64.
pub const MAX_TOKENS: u64 = (1 << 16) - 1;

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Base of the packed segment encoding (`token * BASE^2 + start * BASE + end`).
pub fn segment_base() -> U256 {
    U256::one() << 64
}
