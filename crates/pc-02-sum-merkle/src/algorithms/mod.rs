//! Tree construction and proof verification.

pub mod sum_merkle_tree;

pub use sum_merkle_tree::{SumMerkleTree, SumMerkleTreeNode};
