//! # State Manager
//!
//! Leaf set of plain state updates, driven by whole transactions.

use super::base::BaseStateManager;
use crate::domain::{Segment, SegmentStateError, SignedTransaction, StateUpdate};
use crate::predicates::PredicatesManager;
use std::sync::Arc;
use tracing::debug;

/// State engine over [`StateUpdate`] leaves.
#[derive(Clone, Debug)]
pub struct StateManager {
    base: BaseStateManager<StateUpdate>,
}

impl StateManager {
    /// Empty engine.
    pub fn new(predicates: Arc<PredicatesManager>) -> Self {
        Self {
            base: BaseStateManager::new(predicates),
        }
    }

    /// Underlying leaf set.
    pub fn base(&self) -> &BaseStateManager<StateUpdate> {
        &self.base
    }

    /// Mutable access for single-output operations.
    pub fn base_mut(&mut self) -> &mut BaseStateManager<StateUpdate> {
        &mut self.base
    }

    /// Does every output of `tx` deprecate the leaves it hits?
    ///
    /// A transaction without outputs is never contained.
    pub fn is_contain(&self, tx: &SignedTransaction) -> bool {
        if tx.state_updates.is_empty() {
            return false;
        }
        let hash = tx.tx_hash();
        let witness = tx.transaction_witness();
        tx.state_updates
            .iter()
            .all(|o| self.base.is_contain_update(&hash, o, &witness))
    }

    /// Apply `tx` to the leaf set, all outputs or nothing.
    ///
    /// Returns the deprecated leaves; empty when any output fails.
    pub fn spend(&mut self, tx: &SignedTransaction) -> Vec<StateUpdate> {
        let hash = tx.tx_hash();
        let witness = tx.transaction_witness();
        let mut scratch = self.base.clone();
        let mut spent = Vec::new();
        for output in &tx.state_updates {
            let removed = scratch.spend_update(&hash, output, &witness);
            if removed.is_empty() {
                debug!("[pc-01] spend rejected at output {}", output.segment);
                return Vec::new();
            }
            spent.extend(removed);
        }
        if !spent.is_empty() {
            self.base = scratch;
        }
        spent
    }

    /// Insert every output. One flag per output.
    pub fn insert(&mut self, tx: &SignedTransaction) -> Vec<bool> {
        tx.state_updates
            .iter()
            .map(|o| self.base.insert_leaf(o.clone()))
            .collect()
    }

    /// Insert a chain-verified deposit.
    pub fn insert_deposit_tx(&mut self, deposit: StateUpdate) -> bool {
        self.base.insert_leaf(deposit)
    }

    /// Drop the leaf whose segment equals `segment`.
    pub fn start_exit(&mut self, segment: &Segment) {
        self.base.start_exit(segment)
    }

    /// Current leaves.
    pub fn state_updates(&self) -> &[StateUpdate] {
        self.base.leaves()
    }

    /// Leaves in storage form.
    pub fn serialize(&self) -> Vec<String> {
        self.base.leaves().iter().map(|l| l.serialize()).collect()
    }

    /// Restore leaves from storage form.
    pub fn deserialize(&mut self, data: &[String]) -> Result<(), SegmentStateError> {
        let leaves = data
            .iter()
            .map(|d| StateUpdate::deserialize(d))
            .collect::<Result<Vec<_>, _>>()?;
        self.base.set_leaves(leaves);
        Ok(())
    }

    /// Leaves as a JSON array.
    pub fn to_json(&self) -> Result<String, SegmentStateError> {
        Ok(serde_json::to_string(&self.serialize())?)
    }

    /// Engine restored from [`StateManager::to_json`] output.
    pub fn from_json(predicates: Arc<PredicatesManager>, json: &str) -> Result<Self, SegmentStateError> {
        let data: Vec<String> = serde_json::from_str(json)?;
        let mut manager = Self::new(predicates);
        manager.deserialize(&data)?;
        Ok(manager)
    }
}
