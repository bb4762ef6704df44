//! # Wallet State
//!
//! The wallet's own leaf set. Leaves are proven transaction outputs, so an
//! exit can always be backed by the inclusion proof it was received with.
//! Deposits enter as proof-less leaves.

use pc_01_segment_state::{BaseStateManager, LeafState, PredicatesManager, Segment, StateUpdate};
use pc_02_sum_merkle::SignedTransactionWithProof;
use pc_telemetry::{metric_inc, STATE_SPENDS};
use std::sync::Arc;
use tracing::debug;

/// State engine over proven outputs.
#[derive(Clone, Debug)]
pub struct WalletStateManager {
    base: BaseStateManager<SignedTransactionWithProof>,
}

impl WalletStateManager {
    /// Empty wallet.
    pub fn new(predicates: Arc<PredicatesManager>) -> Self {
        Self {
            base: BaseStateManager::new(predicates),
        }
    }

    /// Current UTXOs, ascending by start.
    pub fn utxos(&self) -> &[SignedTransactionWithProof] {
        self.base.leaves()
    }

    /// Sum of UTXO amounts for `token_id`.
    pub fn balance(&self, token_id: u64) -> u64 {
        self.utxos()
            .iter()
            .map(|u| u.segment())
            .filter(|s| s.token_id() == token_id)
            .map(|s| s.amount())
            .sum()
    }

    /// Would `tx` deprecate the UTXOs it hits?
    pub fn is_contain(&self, tx: &SignedTransactionWithProof) -> bool {
        self.base
            .is_contain_update(&tx.tx_hash(), tx.output(), &tx.transaction_witness())
    }

    /// Deprecate the UTXOs hit by `tx`'s output. Returns the spent UTXOs.
    pub fn spend(&mut self, tx: &SignedTransactionWithProof) -> Vec<SignedTransactionWithProof> {
        let spent = self
            .base
            .spend_update(&tx.tx_hash(), tx.output(), &tx.transaction_witness());
        if spent.is_empty() {
            metric_inc!(STATE_SPENDS, &["rejected"]);
        } else {
            metric_inc!(STATE_SPENDS, &["applied"]);
            debug!("[pc-03] wallet spent {} utxos at block {}", spent.len(), tx.blk_num);
        }
        spent
    }

    /// Add a received output.
    pub fn insert(&mut self, tx: SignedTransactionWithProof) -> bool {
        self.base.insert_leaf(tx)
    }

    /// Add a chain-verified deposit.
    pub fn insert_deposit_tx(&mut self, deposit: StateUpdate) -> bool {
        self.base.insert_leaf(SignedTransactionWithProof::deposit(deposit))
    }

    /// Drop the UTXO whose segment equals `segment`.
    pub fn start_exit(&mut self, segment: &Segment) {
        self.base.start_exit(segment)
    }

    /// UTXO covering exactly `segment`.
    pub fn find(&self, segment: &Segment) -> Option<&SignedTransactionWithProof> {
        self.utxos().iter().find(|u| u.segment() == *segment)
    }
}
