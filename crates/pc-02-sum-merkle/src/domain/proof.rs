//! # Sum-Merkle Proof
//!
//! Path from one leaf to the root. Each element is 41 bytes:
//! `flag(1) ‖ siblingWeight(8, BE) ‖ siblingHash(32)`, where flag 0 puts the
//! sibling on the right and 1 on the left.

use pc_01_segment_state::Segment;
use serde::{Deserialize, Serialize};
use shared_types::{to_hex, Hash};

/// Size of one proof element.
pub const PROOF_ELEMENT_SIZE: usize = 41;

/// Sibling on the right.
pub const FLAG_RIGHT: u8 = 0;

/// Sibling on the left.
pub const FLAG_LEFT: u8 = 1;

/// Inclusion or exclusion path for one tree leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumMerkleProof {
    /// Tokens committed by the tree.
    pub num_tokens: u64,
    /// Leaf index across all tokens.
    pub index: usize,
    /// Leaf range.
    pub segment: Segment,
    /// Leaf hash (transaction hash or the empty hash).
    #[serde(with = "shared_types::hex_array")]
    pub leaf: Hash,
    /// Concatenated proof elements.
    #[serde(with = "shared_types::hex_bytes")]
    pub proof: Vec<u8>,
}

impl SumMerkleProof {
    /// Number of path elements.
    pub fn depth(&self) -> usize {
        self.proof.len() / PROOF_ELEMENT_SIZE
    }

    /// On-chain form: `numTokens(2, BE) ‖ proof`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.proof.len());
        out.extend_from_slice(&(self.num_tokens as u16).to_be_bytes());
        out.extend_from_slice(&self.proof);
        out
    }

    /// [`SumMerkleProof::to_bytes`] as `0x` hex.
    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }
}

/// Encode one proof element.
pub fn encode_element(flag: u8, weight: u64, hash: &Hash) -> [u8; PROOF_ELEMENT_SIZE] {
    let mut out = [0u8; PROOF_ELEMENT_SIZE];
    out[0] = flag;
    out[1..9].copy_from_slice(&weight.to_be_bytes());
    out[9..].copy_from_slice(hash);
    out
}
