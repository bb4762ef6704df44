//! # Sum-Merkle Tree
//!
//! Merkle tree whose nodes carry the total weight (range length) beneath
//! them, so a path proves both membership and the exact range of a leaf.
//!
//! # Algorithm
//!
//! 1. Leaves are `(hash, len)`; an odd level is padded with the empty node
//! 2. `parent.hash = keccak(left.len(8) ‖ left.hash ‖ right.len(8) ‖ right.hash)`
//! 3. `parent.len = left.len + right.len`
//!
//! Verification walks the path while narrowing `[0, total)` by the sibling
//! weights; the narrowed window must equal the claimed range.

use crate::domain::proof::{encode_element, SumMerkleProof, FLAG_LEFT, FLAG_RIGHT, PROOF_ELEMENT_SIZE};
use crate::domain::BlockError;
use pc_01_segment_state::Segment;
use shared_types::{empty_leaf_hash, keccak256_concat, Hash};

/// Tree node: hash and weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SumMerkleTreeNode {
    /// Node hash
    pub hash: Hash,
    /// Weight beneath this node
    pub len: u64,
}

impl SumMerkleTreeNode {
    /// Create a node.
    pub fn new(hash: Hash, len: u64) -> Self {
        Self { hash, len }
    }

    /// Padding node: empty hash, zero weight.
    pub fn empty() -> Self {
        Self::new(empty_leaf_hash(), 0)
    }

    /// Parent of two nodes.
    pub fn parent(left: &Self, right: &Self) -> Self {
        Self {
            hash: hash_pair(left.len, &left.hash, right.len, &right.hash),
            len: left.len.saturating_add(right.len),
        }
    }
}

fn hash_pair(left_len: u64, left: &Hash, right_len: u64, right: &Hash) -> Hash {
    keccak256_concat(&[&left_len.to_be_bytes(), left, &right_len.to_be_bytes(), right])
}

/// Complete tree with every padded level retained for proof building.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumMerkleTree {
    leaf_count: usize,
    levels: Vec<Vec<SumMerkleTreeNode>>,
}

impl SumMerkleTree {
    /// Build from leaves in range order.
    pub fn new(leaves: Vec<SumMerkleTreeNode>) -> Self {
        let leaf_count = leaves.len();
        let mut current = if leaves.is_empty() {
            vec![SumMerkleTreeNode::empty()]
        } else {
            leaves
        };
        let mut levels = Vec::new();
        while current.len() > 1 {
            if current.len() % 2 == 1 {
                current.push(SumMerkleTreeNode::empty());
            }
            let next = current
                .chunks(2)
                .map(|pair| SumMerkleTreeNode::parent(&pair[0], &pair[1]))
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);
        Self { leaf_count, levels }
    }

    /// Root hash.
    pub fn root(&self) -> Hash {
        self.top().hash
    }

    /// Total weight.
    pub fn total(&self) -> u64 {
        self.top().len
    }

    /// Real (unpadded) leaves.
    pub fn leaves(&self) -> &[SumMerkleTreeNode] {
        &self.levels[0][..self.leaf_count]
    }

    fn top(&self) -> SumMerkleTreeNode {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(SumMerkleTreeNode::empty)
    }

    /// Raw path for the leaf at `index`.
    pub fn path(&self, index: usize) -> Result<Vec<u8>, BlockError> {
        if index >= self.leaf_count {
            return Err(BlockError::LeafOutOfRange {
                index,
                len: self.leaf_count,
            });
        }
        let depth = self.levels.len() - 1;
        let mut out = Vec::with_capacity(depth * PROOF_ELEMENT_SIZE);
        let mut position = index;
        for level in &self.levels[..depth] {
            let sibling = level[position ^ 1];
            let flag = if position % 2 == 0 { FLAG_RIGHT } else { FLAG_LEFT };
            out.extend_from_slice(&encode_element(flag, sibling.len, &sibling.hash));
            position /= 2;
        }
        Ok(out)
    }

    /// Global start offset of every real leaf.
    fn offsets(&self) -> Vec<u64> {
        self.leaves()
            .iter()
            .scan(0u64, |acc, leaf| {
                let start = *acc;
                *acc = acc.saturating_add(leaf.len);
                Some(start)
            })
            .collect()
    }

    fn make_proof(&self, num_tokens: u64, index: usize, offset: u64) -> Result<SumMerkleProof, BlockError> {
        let leaf = self.levels[0][index];
        Ok(SumMerkleProof {
            num_tokens,
            index,
            segment: Segment::from_global(offset, offset + leaf.len)?,
            leaf: leaf.hash,
            proof: self.path(index)?,
        })
    }

    /// Proofs for every leaf carrying `hash`, in range order.
    pub fn proofs(&self, num_tokens: u64, hash: &Hash) -> Result<Vec<SumMerkleProof>, BlockError> {
        let offsets = self.offsets();
        self.leaves()
            .iter()
            .enumerate()
            .filter(|(_, leaf)| &leaf.hash == hash)
            .map(|(i, _)| self.make_proof(num_tokens, i, offsets[i]))
            .collect()
    }

    /// Proofs for every leaf overlapping the global range `[start, end)`.
    pub fn get_proof_by_range(
        &self,
        num_tokens: u64,
        start: u64,
        end: u64,
    ) -> Result<Vec<SumMerkleProof>, BlockError> {
        let offsets = self.offsets();
        self.leaves()
            .iter()
            .enumerate()
            .filter(|(i, leaf)| leaf.len > 0 && offsets[*i] < end && offsets[*i] + leaf.len > start)
            .map(|(i, _)| self.make_proof(num_tokens, i, offsets[i]))
            .collect()
    }

    /// Check that `leaf` occupies exactly `[start, end)` of a tree of
    /// weight `total` with root `root`.
    ///
    /// Malformed proofs and arithmetic overflow yield `false`.
    pub fn verify(start: u64, end: u64, leaf: &Hash, total: u64, root: &Hash, proof: &[u8]) -> bool {
        if end <= start || proof.len() % PROOF_ELEMENT_SIZE != 0 {
            return false;
        }
        let mut node = *leaf;
        let mut amount = end - start;
        let mut cur_left = 0u64;
        let mut cur_right = total;

        for element in proof.chunks(PROOF_ELEMENT_SIZE) {
            let mut weight_bytes = [0u8; 8];
            weight_bytes.copy_from_slice(&element[1..9]);
            let weight = u64::from_be_bytes(weight_bytes);
            let mut sibling = [0u8; 32];
            sibling.copy_from_slice(&element[9..]);

            match element[0] {
                FLAG_RIGHT => {
                    node = hash_pair(amount, &node, weight, &sibling);
                    cur_right = match cur_right.checked_sub(weight) {
                        Some(v) => v,
                        None => return false,
                    };
                }
                FLAG_LEFT => {
                    node = hash_pair(weight, &sibling, amount, &node);
                    cur_left = match cur_left.checked_add(weight) {
                        Some(v) => v,
                        None => return false,
                    };
                }
                _ => return false,
            }
            amount = match amount.checked_add(weight) {
                Some(v) => v,
                None => return false,
            };
        }

        node == *root && cur_left == start && cur_right == end
    }
}
