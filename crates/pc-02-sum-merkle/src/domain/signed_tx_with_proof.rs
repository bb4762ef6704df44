//! # Signed Transaction With Proof
//!
//! Binds output `state_index` of a transaction to a block through the
//! sum-merkle proofs of every output. Also usable as a state engine leaf:
//! the leaf is the (possibly narrowed) output in `state_update`.
//!
//! ## On-chain proof bytes
//!
//! ```text
//! header:    numTx(2) txIndex(2) root(32) timestamp(8) numNodes(2)
//! per proof: txOffset(2) txSize(2) segment(32) originalAmount(8) numTokens(2) body(n * 41)
//! ```
//!
//! A deposit carries no proofs and encodes as a single zero byte.

use crate::algorithms::SumMerkleTree;
use crate::domain::errors::BlockError;
use crate::domain::proof::SumMerkleProof;
use pc_01_segment_state::{
    LeafState, PredicatesManager, Segment, SegmentStateError, SignedTransaction, StateUpdate,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_crypto::{EthSignature, Secp256k1KeyPair};
use shared_types::{keccak256_concat, to_hex, u256_word, Hash, TOTAL_AMOUNT, ZERO_HASH};

/// A transaction output with its block inclusion proofs.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransactionWithProof {
    /// The full transaction.
    #[serde(rename = "tx")]
    pub signed_tx: SignedTransaction,
    /// Which output this object stands for.
    #[serde(rename = "i")]
    pub state_index: usize,
    /// Block super root.
    #[serde(rename = "sr", with = "shared_types::hex_array")]
    pub super_root: Hash,
    /// Block sum-merkle root.
    #[serde(rename = "r", with = "shared_types::hex_array")]
    pub root: Hash,
    /// Block timestamp.
    #[serde(rename = "ts")]
    #[serde_as(as = "DisplayFromStr")]
    pub timestamp: u64,
    /// One proof per output, in output order.
    pub proofs: Vec<SumMerkleProof>,
    /// Block number.
    #[serde(rename = "blkNum")]
    #[serde_as(as = "DisplayFromStr")]
    pub blk_num: u64,
    /// Current (possibly narrowed) output.
    #[serde(rename = "stateUpdate")]
    pub state_update: StateUpdate,
    /// Operator confirmation signatures over [`SignedTransactionWithProof::merkle_hash`].
    #[serde(rename = "confSigs", default)]
    pub conf_sigs: Vec<EthSignature>,
    /// Set once the history of this output has been verified.
    #[serde(rename = "v", default)]
    pub verified: bool,
}

impl SignedTransactionWithProof {
    /// Wrap output `state_index` of `signed_tx`.
    pub fn new(
        signed_tx: SignedTransaction,
        state_index: usize,
        super_root: Hash,
        root: Hash,
        timestamp: u64,
        proofs: Vec<SumMerkleProof>,
        blk_num: u64,
    ) -> Result<Self, BlockError> {
        let state_update = signed_tx.state_update(state_index).cloned().ok_or_else(|| {
            BlockError::TransactionNotFound(format!(
                "{} has no output {}",
                to_hex(&signed_tx.tx_hash()),
                state_index
            ))
        })?;
        Ok(Self {
            signed_tx,
            state_index,
            super_root,
            root,
            timestamp,
            proofs,
            blk_num,
            state_update,
            conf_sigs: Vec::new(),
            verified: false,
        })
    }

    /// Proof-less wrapper for a chain-verified deposit.
    pub fn deposit(deposit: StateUpdate) -> Self {
        Self {
            signed_tx: SignedTransaction::new(vec![deposit.clone()]),
            state_index: 0,
            super_root: ZERO_HASH,
            root: ZERO_HASH,
            timestamp: 0,
            proofs: Vec::new(),
            blk_num: deposit.blk_num,
            state_update: deposit,
            conf_sigs: Vec::new(),
            verified: true,
        }
    }

    /// Mark verification state.
    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// No proofs: a deposit.
    pub fn is_deposit(&self) -> bool {
        self.proofs.is_empty()
    }

    /// Current output.
    pub fn output(&self) -> &StateUpdate {
        &self.state_update
    }

    /// Transaction hash.
    pub fn tx_hash(&self) -> Hash {
        self.signed_tx.tx_hash()
    }

    /// Transaction witness bytes.
    pub fn transaction_witness(&self) -> Vec<u8> {
        self.signed_tx.transaction_witness()
    }

    /// Proof of this object's output.
    pub fn get_proof(&self) -> Option<&SumMerkleProof> {
        self.proofs.get(self.state_index)
    }

    /// Output segment as committed in the block.
    pub fn original_segment(&self) -> Option<Segment> {
        self.get_proof().map(|p| p.segment)
    }

    /// Do the proofs commit every output of the transaction under `root`,
    /// and does the current output lie within its committed range?
    pub fn check_inclusion(&self) -> bool {
        let outputs = &self.signed_tx.state_updates;
        if self.proofs.is_empty() || self.proofs.len() != outputs.len() {
            return false;
        }
        let hash = self.tx_hash();
        let all_proven = self.proofs.iter().zip(outputs).all(|(proof, output)| {
            let Some(total) = TOTAL_AMOUNT.checked_mul(proof.num_tokens) else {
                return false;
            };
            SumMerkleTree::verify(
                output.segment.global_start(),
                output.segment.global_end(),
                &hash,
                total,
                &self.root,
                &proof.proof,
            )
        });
        let within = outputs
            .get(self.state_index)
            .map(|o| o.segment.contains(&self.state_update.segment))
            .unwrap_or(false);
        all_proven && within
    }

    /// `keccak(txHash ‖ superRoot)`: the digest operators confirm.
    pub fn merkle_hash(&self) -> Hash {
        keccak256_concat(&[&self.tx_hash(), &self.super_root])
    }

    /// Append a confirmation signature over [`SignedTransactionWithProof::merkle_hash`].
    pub fn confirm_merkle_proofs(&mut self, keypair: &Secp256k1KeyPair) -> Result<(), BlockError> {
        let signature = keypair
            .sign_hash(&self.merkle_hash())
            .map_err(SegmentStateError::from)?;
        self.conf_sigs.push(signature);
        Ok(())
    }

    fn tx_size(&self, index: usize) -> usize {
        self.signed_tx
            .state_update(index)
            .map(|s| s.encode().len())
            .unwrap_or(0)
    }

    /// On-chain proof bytes.
    ///
    /// Fails when a count, offset or size exceeds its 2-byte field.
    pub fn get_proof_bytes(&self) -> Result<Vec<u8>, BlockError> {
        if self.is_deposit() {
            return Ok(vec![0]);
        }
        let num_nodes = self.proofs[0].depth();
        let mut out = Vec::new();
        out.extend_from_slice(&u16_field("numTx", self.proofs.len())?);
        out.extend_from_slice(&u16_field("txIndex", self.state_index)?);
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&u16_field("numNodes", num_nodes)?);

        let mut offset = 0usize;
        for (i, proof) in self.proofs.iter().enumerate() {
            let size = self.tx_size(i);
            let original_amount = self
                .signed_tx
                .state_update(i)
                .map(|s| s.segment.amount())
                .unwrap_or(0);
            out.extend_from_slice(&u16_field("txOffset", offset)?);
            out.extend_from_slice(&u16_field("txSize", size)?);
            out.extend_from_slice(&u256_word(proof.segment.to_big_number()));
            out.extend_from_slice(&original_amount.to_be_bytes());
            out.extend_from_slice(&proof.to_bytes());
            offset += size;
        }
        Ok(out)
    }

    /// [`SignedTransactionWithProof::get_proof_bytes`] as `0x` hex.
    pub fn get_proof_as_hex(&self) -> Result<String, BlockError> {
        Ok(to_hex(&self.get_proof_bytes()?))
    }
}

fn u16_field(field: &'static str, value: usize) -> Result<[u8; 2], BlockError> {
    u16::try_from(value)
        .map(u16::to_be_bytes)
        .map_err(|_| BlockError::FieldOverflow { field, value })
}

impl LeafState for SignedTransactionWithProof {
    fn segment(&self) -> Segment {
        self.state_update.segment
    }

    fn verify_deprecation(
        &self,
        hash: &Hash,
        next: &StateUpdate,
        witness: &[u8],
        predicates: &PredicatesManager,
    ) -> bool {
        self.state_update
            .verify_deprecation(hash, next, witness, predicates)
    }

    fn get_remaining_state(&self, consumed: &Segment) -> Vec<Self> {
        self.state_update
            .get_remaining_state(consumed)
            .into_iter()
            .map(|state_update| Self {
                state_update,
                ..self.clone()
            })
            .collect()
    }

    fn get_sub_state_update(&self, segment: &Segment) -> StateUpdate {
        self.state_update.get_sub_state_update(segment)
    }

    fn state_hash(&self) -> Hash {
        self.state_update.hash()
    }

    fn raw_state(&self) -> &[u8] {
        &self.state_update.state
    }
}
