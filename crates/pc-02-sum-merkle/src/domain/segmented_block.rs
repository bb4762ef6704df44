//! # Segmented Block
//!
//! The part of a block relevant to one segment: an inclusion item for every
//! output overlapping it and an exclusion item for every gap.

use crate::domain::exclusion_proof::ExclusionProof;
use crate::domain::signed_tx_with_proof::SignedTransactionWithProof;
use pc_01_segment_state::Segment;
use serde::{Deserialize, Serialize};

/// One item of a segmented block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SegmentedBlockItem {
    /// A transaction output overlapping the segment
    #[serde(rename = "I")]
    Inclusion(SignedTransactionWithProof),
    /// A gap overlapping the segment
    #[serde(rename = "E")]
    Exclusion(ExclusionProof),
}

/// Block data restricted to `original_segment`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedBlock {
    /// Segment the block was cut for.
    pub original_segment: Segment,
    /// Items in range order.
    pub items: Vec<SegmentedBlockItem>,
    /// Block number.
    pub blk_num: u64,
}

impl SegmentedBlock {
    /// Create a segmented block.
    pub fn new(original_segment: Segment, items: Vec<SegmentedBlockItem>, blk_num: u64) -> Self {
        Self {
            original_segment,
            items,
            blk_num,
        }
    }
}
