//! # Segment History
//!
//! The stored proofs of one segment, and the per-block replay step.
//!
//! Replaying a block checks every stored item against the header root:
//! inclusions must verify and then legally deprecate the replay engine's
//! leaves, exclusions must verify. Only the output an inclusion item stands
//! for is applied; the other outputs of its transaction belong to other
//! histories.

use crate::domain::{HistoryError, StoreError};
use crate::ports::outbound::SegmentStore;
use pc_01_segment_state::{Segment, StateManager};
use pc_02_sum_merkle::{SegmentedBlock, SegmentedBlockItem};
use shared_types::Hash;
use tracing::debug;

/// Stored history of one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentHistory {
    key: String,
    original_segment: Segment,
}

impl SegmentHistory {
    /// History for `original_segment` stored under `key`.
    pub fn new(key: impl Into<String>, original_segment: Segment) -> Self {
        Self {
            key: key.into(),
            original_segment,
        }
    }

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Segment whose provenance this history proves.
    pub fn original_segment(&self) -> Segment {
        self.original_segment
    }

    /// Persist a segmented block.
    pub async fn append<S: SegmentStore + ?Sized>(
        &self,
        store: &S,
        segmented_block: &SegmentedBlock,
    ) -> Result<(), HistoryError> {
        let serialized = serde_json::to_string(segmented_block).map_err(StoreError::from)?;
        store
            .add_proof(&self.key, segmented_block.blk_num, serialized)
            .await?;
        Ok(())
    }

    /// Load the segmented block stored for `blk_num`.
    pub async fn get_segmented_block<S: SegmentStore + ?Sized>(
        &self,
        store: &S,
        blk_num: u64,
    ) -> Result<SegmentedBlock, HistoryError> {
        let serialized = store
            .get_proof(&self.key, blk_num)
            .await?
            .ok_or_else(|| HistoryError::MissingProof {
                key: self.key.clone(),
                blk_num,
            })?;
        serde_json::from_str(&serialized)
            .map_err(|e| HistoryError::CorruptedRecord(format!("proof at block {}: {}", blk_num, e)))
    }

    /// Replay block `blk_num` onto `engine`.
    ///
    /// `engine` may be partially updated when this fails.
    pub async fn verify<S: SegmentStore + ?Sized>(
        &self,
        store: &S,
        engine: &mut StateManager,
        blk_num: u64,
        root: &Hash,
    ) -> Result<(), HistoryError> {
        let segmented_block = self.get_segmented_block(store, blk_num).await?;
        if segmented_block.blk_num != blk_num {
            return Err(HistoryError::ProofCheckFailed {
                blk_num,
                reason: format!("stored proof is for block {}", segmented_block.blk_num),
            });
        }

        for item in &segmented_block.items {
            match item {
                SegmentedBlockItem::Inclusion(tx) => {
                    if tx.root != *root || !tx.check_inclusion() {
                        return Err(HistoryError::ProofCheckFailed {
                            blk_num,
                            reason: "fail to check inclusion".into(),
                        });
                    }
                    let hash = tx.tx_hash();
                    let witness = tx.transaction_witness();
                    let output = tx.output();
                    if !engine.base().is_contain_update(&hash, output, &witness) {
                        return Err(HistoryError::InvalidHistory {
                            blk_num,
                            reason: format!("transition to {} is not contained", output.segment),
                        });
                    }
                    engine.base_mut().spend_update(&hash, output, &witness);
                    engine.base_mut().insert_leaf(output.clone());
                }
                SegmentedBlockItem::Exclusion(proof) => {
                    if proof.root != *root || !proof.check_exclusion() {
                        return Err(HistoryError::ProofCheckFailed {
                            blk_num,
                            reason: "fail to check exclusion".into(),
                        });
                    }
                }
            }
        }
        debug!(
            "[pc-03] {} replayed block {} ({} items)",
            self.key,
            blk_num,
            segmented_block.items.len()
        );
        Ok(())
    }
}
