//! # Keccak-256
//!
//! All commitments in the protocol (state update hashes, transaction hashes,
//! sum-merkle nodes, super roots) use Ethereum's Keccak-256.

use crate::entities::{Hash, ZERO_HASH};
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Keccak-256 over the concatenation of `parts`, without an intermediate buffer.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Hash of the 32-byte zero word, used for exclusion leaves and padding nodes.
pub fn empty_leaf_hash() -> Hash {
    keccak256(&ZERO_HASH)
}
