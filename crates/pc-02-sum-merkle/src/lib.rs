//! # PC-02 Sum-Merkle Commitments
//!
//! Range-weighted merkle commitments for Plasma blocks.
//!
//! **Subsystem ID:** 02  
//! **Architecture:** Domain + algorithms
//!
//! ## Purpose
//!
//! Every block commits, per token, a partition of `[0, TOTAL_AMOUNT)` into
//! transaction outputs and empty gaps. A leaf's weight is the length of its
//! range, so a path proves both the leaf hash and the exact coordinates it
//! covers:
//! - Inclusion: a transaction owns `[start, end)` in this block
//! - Exclusion: nobody touched `[start, end)` in this block
//!
//! ## Module Structure
//!
//! ```text
//! pc-02-sum-merkle/
//! ├── domain/          # Block, proofs, SignedTransactionWithProof, SegmentedBlock
//! └── algorithms/      # SumMerkleTree construction and verification
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use algorithms::{SumMerkleTree, SumMerkleTreeNode};
pub use domain::{
    Block, BlockError, ExclusionProof, SegmentedBlock, SegmentedBlockItem,
    SignedTransactionWithProof, SumMerkleProof, PROOF_ELEMENT_SIZE,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
