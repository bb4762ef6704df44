//! Proof that a range holds no transaction output in a block.

use crate::algorithms::SumMerkleTree;
use crate::domain::proof::SumMerkleProof;
use serde::{Deserialize, Serialize};
use shared_types::{empty_leaf_hash, Hash, TOTAL_AMOUNT};

/// Exclusion proof: an empty leaf of the block tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionProof {
    /// Block sum-merkle root.
    #[serde(with = "shared_types::hex_array")]
    pub root: Hash,
    /// Path of the empty leaf.
    pub proof: SumMerkleProof,
}

impl ExclusionProof {
    /// Create an exclusion proof.
    pub fn new(root: Hash, proof: SumMerkleProof) -> Self {
        Self { root, proof }
    }

    /// Does the empty leaf occupy the proof's global range under `root`?
    pub fn check_exclusion(&self) -> bool {
        let Some(total) = TOTAL_AMOUNT.checked_mul(self.proof.num_tokens) else {
            return false;
        };
        SumMerkleTree::verify(
            self.proof.segment.global_start(),
            self.proof.segment.global_end(),
            &empty_leaf_hash(),
            total,
            &self.root,
            &self.proof.proof,
        )
    }
}
