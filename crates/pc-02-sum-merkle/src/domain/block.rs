//! # Block
//!
//! A Plasma block: transactions committed by one sum-merkle root, plus the
//! timestamp-bound super root published on the base chain.
//!
//! ## Tree layout
//!
//! Each token contributes leaves covering exactly `[0, TOTAL_AMOUNT)`:
//! outputs sorted by start, with exclusion leaves (empty hash) filling the
//! gaps. Token subtrees are concatenated in token order. The tree is built
//! once, on first use, and rebuilt only after the transaction set changes.

use crate::algorithms::{SumMerkleTree, SumMerkleTreeNode};
use crate::domain::errors::BlockError;
use crate::domain::exclusion_proof::ExclusionProof;
use crate::domain::proof::SumMerkleProof;
use crate::domain::segmented_block::{SegmentedBlock, SegmentedBlockItem};
use crate::domain::signed_tx_with_proof::SignedTransactionWithProof;
use pc_01_segment_state::{PredicatesManager, Segment, SegmentStateError, SignedTransaction, StateUpdate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_crypto::EthSignature;
use shared_types::{
    empty_leaf_hash, from_hex_array, keccak256_concat, to_hex, Address, Hash, MAX_TOKENS, TOTAL_AMOUNT,
};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// A Plasma block.
#[derive(Clone, Debug)]
pub struct Block {
    number: u64,
    super_root: Option<Hash>,
    timestamp: u64,
    txs: Vec<SignedTransaction>,
    deposit_tx: Option<StateUpdate>,
    is_deposit_block: bool,
    num_tokens: u64,
    conf_sig_map: BTreeMap<String, Vec<EthSignature>>,
    tree: OnceLock<Result<SumMerkleTree, BlockError>>,
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.super_root == other.super_root
            && self.timestamp == other.timestamp
            && self.txs == other.txs
            && self.deposit_tx == other.deposit_tx
            && self.is_deposit_block == other.is_deposit_block
            && self.num_tokens == other.num_tokens
            && self.conf_sig_map == other.conf_sig_map
    }
}

impl Eq for Block {}

impl Block {
    /// Empty block committing `num_tokens` tokens.
    pub fn new(num_tokens: u64) -> Result<Self, BlockError> {
        if num_tokens == 0 || num_tokens > MAX_TOKENS {
            return Err(BlockError::InvalidTokenCount(num_tokens));
        }
        Ok(Self {
            number: 0,
            super_root: None,
            timestamp: 0,
            txs: Vec::new(),
            deposit_tx: None,
            is_deposit_block: false,
            num_tokens,
            conf_sig_map: BTreeMap::new(),
            tree: OnceLock::new(),
        })
    }

    /// Block number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Set the block number.
    pub fn set_block_number(&mut self, number: u64) {
        self.number = number;
    }

    /// Block timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Set the timestamp without touching the super root.
    pub fn set_block_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Published super root, if set.
    pub fn super_root(&self) -> Option<Hash> {
        self.super_root
    }

    /// Record the super root published on chain.
    pub fn set_super_root(&mut self, super_root: Hash) {
        self.super_root = Some(super_root);
    }

    /// Tokens committed by the tree.
    pub fn num_tokens(&self) -> u64 {
        self.num_tokens
    }

    /// Transactions.
    pub fn txs(&self) -> &[SignedTransaction] {
        &self.txs
    }

    /// Deposit carried by a deposit block.
    pub fn deposit_tx(&self) -> Option<&StateUpdate> {
        self.deposit_tx.as_ref()
    }

    /// True once a deposit was attached.
    pub fn is_deposit_block(&self) -> bool {
        self.is_deposit_block
    }

    /// Attach the deposit of a deposit block.
    pub fn set_deposit_tx(&mut self, deposit: StateUpdate) {
        self.deposit_tx = Some(deposit);
        self.is_deposit_block = true;
    }

    /// Append a transaction. Invalidates the cached tree.
    pub fn append_tx(&mut self, tx: SignedTransaction) {
        self.txs.push(tx);
        self.tree = OnceLock::new();
    }

    /// Record an operator confirmation signature for a transaction of this block.
    ///
    /// Returns `false` for unknown transactions and duplicate signatures.
    pub fn append_conf_sig(&mut self, tx: &SignedTransaction, conf_sig: EthSignature) -> bool {
        let hash = tx.tx_hash();
        if self.get_signed_transaction(&hash).is_none() {
            return false;
        }
        let sigs = self.conf_sig_map.entry(to_hex(&hash)).or_default();
        if sigs.contains(&conf_sig) {
            return false;
        }
        sigs.push(conf_sig);
        true
    }

    /// Confirmation signatures recorded for `hash`.
    pub fn conf_sigs(&self, hash: &Hash) -> &[EthSignature] {
        self.conf_sig_map
            .get(&to_hex(hash))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The block tree.
    pub fn tree(&self) -> Result<&SumMerkleTree, BlockError> {
        self.tree
            .get_or_init(|| self.create_tree())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Sum-merkle root.
    pub fn get_root(&self) -> Result<Hash, BlockError> {
        Ok(self.tree()?.root())
    }

    /// `keccak(root ‖ timestamp(8))` for the current contents.
    pub fn check_super_root(&self) -> Result<Hash, BlockError> {
        let root = self.get_root()?;
        Ok(keccak256_concat(&[&root, &self.timestamp.to_be_bytes()]))
    }

    /// Does the recorded super root match the contents?
    pub fn verify_super_root(&self) -> Result<bool, BlockError> {
        let recorded = self.super_root.ok_or(BlockError::SuperRootNotSet)?;
        Ok(self.check_super_root()? == recorded)
    }

    /// Set the timestamp and record the resulting super root.
    pub fn seal(&mut self, timestamp: u64) -> Result<Hash, BlockError> {
        self.timestamp = timestamp;
        let super_root = self.check_super_root()?;
        self.super_root = Some(super_root);
        Ok(super_root)
    }

    /// Proofs of every leaf of transaction `hash`, in range order.
    pub fn get_proof(&self, hash: &Hash) -> Result<Vec<SumMerkleProof>, BlockError> {
        self.tree()?.proofs(self.num_tokens, hash)
    }

    /// Transaction with hash `hash`.
    pub fn get_signed_transaction(&self, hash: &Hash) -> Option<&SignedTransaction> {
        self.txs.iter().find(|tx| &tx.tx_hash() == hash)
    }

    /// Proofs of `tx` reordered to match its outputs.
    fn output_proofs(&self, tx: &SignedTransaction) -> Result<Vec<SumMerkleProof>, BlockError> {
        let proofs = self.get_proof(&tx.tx_hash())?;
        tx.state_updates
            .iter()
            .map(|output| {
                proofs
                    .iter()
                    .find(|p| p.segment == output.segment)
                    .cloned()
                    .ok_or_else(|| {
                        BlockError::from(SegmentStateError::OutputNotFound {
                            token_id: output.segment.token_id(),
                            start: output.segment.start(),
                        })
                    })
            })
            .collect()
    }

    fn sealed_super_root(&self) -> Result<Hash, BlockError> {
        self.super_root.ok_or(BlockError::SuperRootNotSet)
    }

    /// One proven object per output of transaction `hash`.
    pub fn get_signed_transaction_with_proof(
        &self,
        hash: &Hash,
    ) -> Result<Vec<SignedTransactionWithProof>, BlockError> {
        let super_root = self.sealed_super_root()?;
        let tx = self
            .get_signed_transaction(hash)
            .ok_or_else(|| BlockError::TransactionNotFound(to_hex(hash)))?;
        let root = self.get_root()?;
        let proofs = self.output_proofs(tx)?;
        (0..tx.state_updates.len())
            .map(|index| {
                SignedTransactionWithProof::new(
                    tx.clone(),
                    index,
                    super_root,
                    root,
                    self.timestamp,
                    proofs.clone(),
                    self.number,
                )
            })
            .collect()
    }

    /// Inclusion and exclusion items for every leaf overlapping `segment`.
    pub fn get_segmented_block(&self, segment: &Segment) -> Result<SegmentedBlock, BlockError> {
        let super_root = self.sealed_super_root()?;
        let root = self.get_root()?;
        let empty = empty_leaf_hash();
        let proofs = self.tree()?.get_proof_by_range(
            self.num_tokens,
            segment.global_start(),
            segment.global_end(),
        )?;

        let items = proofs
            .into_iter()
            .map(|proof| {
                if proof.leaf == empty {
                    return Ok(SegmentedBlockItem::Exclusion(ExclusionProof::new(root, proof)));
                }
                let tx = self
                    .get_signed_transaction(&proof.leaf)
                    .ok_or_else(|| BlockError::TransactionNotFound(to_hex(&proof.leaf)))?;
                let index = tx.get_index(&proof.segment)?;
                let item = SignedTransactionWithProof::new(
                    tx.clone(),
                    index,
                    super_root,
                    root,
                    self.timestamp,
                    self.output_proofs(tx)?,
                    self.number,
                )?;
                Ok(SegmentedBlockItem::Inclusion(item))
            })
            .collect::<Result<Vec<_>, BlockError>>()?;

        Ok(SegmentedBlock::new(*segment, items, self.number))
    }

    /// Does `tx`'s proof commit its transaction over `segment` in this block?
    pub fn check_inclusion(
        &self,
        tx: &SignedTransactionWithProof,
        segment: &Segment,
    ) -> Result<bool, BlockError> {
        let Some(proof) = tx.get_proof() else {
            return Ok(false);
        };
        let Some(total) = TOTAL_AMOUNT.checked_mul(proof.num_tokens) else {
            return Ok(false);
        };
        Ok(SumMerkleTree::verify(
            segment.global_start(),
            segment.global_end(),
            &tx.tx_hash(),
            total,
            &self.get_root()?,
            &proof.proof,
        ))
    }

    /// Transactions with an output owned by `owner`, or signed by `owner`.
    pub fn get_user_transactions(
        &self,
        owner: &Address,
        predicates: &PredicatesManager,
    ) -> Vec<&SignedTransaction> {
        self.txs
            .iter()
            .filter(|tx| {
                let has_output = tx
                    .state_updates
                    .iter()
                    .any(|output| output.is_owned_by(owner, predicates));
                has_output || tx.signers().contains(owner)
            })
            .collect()
    }

    /// Proven objects for every output of every user transaction.
    pub fn get_user_transaction_and_proofs(
        &self,
        owner: &Address,
        predicates: &PredicatesManager,
    ) -> Result<Vec<SignedTransactionWithProof>, BlockError> {
        let mut out = Vec::new();
        for tx in self.get_user_transactions(owner, predicates) {
            out.extend(self.get_signed_transaction_with_proof(&tx.tx_hash())?);
        }
        Ok(out)
    }

    fn create_tree(&self) -> Result<SumMerkleTree, BlockError> {
        let hashed: Vec<(Hash, &SignedTransaction)> =
            self.txs.iter().map(|tx| (tx.tx_hash(), tx)).collect();
        let per_token = (0..self.num_tokens)
            .into_par_iter()
            .map(|token_id| create_token_tree(token_id, &hashed))
            .collect::<Result<Vec<_>, BlockError>>()?;
        let leaves: Vec<SumMerkleTreeNode> = per_token.into_iter().flatten().collect();
        debug!(
            "[pc-02] built tree for block {} with {} leaves over {} tokens",
            self.number,
            leaves.len(),
            self.num_tokens
        );
        Ok(SumMerkleTree::new(leaves))
    }

    /// JSON form.
    pub fn to_json(&self) -> Result<String, BlockError> {
        Ok(serde_json::to_string(&BlockData::try_from(self)?)?)
    }

    /// Parse [`Block::to_json`] output.
    pub fn from_json(json: &str) -> Result<Self, BlockError> {
        let data: BlockData = serde_json::from_str(json)?;
        Block::try_from(data)
    }
}

/// Leaves of one token: outputs sorted by start, gaps filled with exclusion leaves.
fn create_token_tree(
    token_id: u64,
    txs: &[(Hash, &SignedTransaction)],
) -> Result<Vec<SumMerkleTreeNode>, BlockError> {
    let mut outputs: Vec<(Segment, Hash)> = txs
        .iter()
        .flat_map(|(hash, tx)| {
            tx.get_segments()
                .into_iter()
                .filter(|s| s.token_id() == token_id && s.amount() > 0)
                .map(move |s| (s, *hash))
        })
        .collect();
    outputs.sort_by_key(|(s, _)| s.start());

    let empty = empty_leaf_hash();
    let mut nodes = Vec::with_capacity(outputs.len() * 2 + 1);
    let mut prev_end = 0u64;
    for (segment, hash) in outputs {
        if segment.start() > prev_end {
            nodes.push(SumMerkleTreeNode::new(empty, segment.start() - prev_end));
        } else if segment.start() < prev_end {
            return Err(BlockError::OverlappingSegments {
                token_id,
                start: segment.start(),
                prev_end,
            });
        }
        nodes.push(SumMerkleTreeNode::new(hash, segment.amount()));
        prev_end = segment.end();
    }
    if prev_end < TOTAL_AMOUNT {
        nodes.push(SumMerkleTreeNode::new(empty, TOTAL_AMOUNT - prev_end));
    }
    Ok(nodes)
}

/// JSON shape of a block.
#[serde_as]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockData {
    number: u64,
    is_deposit_block: bool,
    deposit_tx: Option<StateUpdate>,
    txs: Vec<SignedTransaction>,
    root: Option<String>,
    num_tokens: u64,
    super_root: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    timestamp: u64,
    conf_sigs: BTreeMap<String, Vec<EthSignature>>,
}

impl TryFrom<&Block> for BlockData {
    type Error = BlockError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        let root = if block.txs.is_empty() {
            None
        } else {
            Some(to_hex(&block.get_root()?))
        };
        Ok(Self {
            number: block.number,
            is_deposit_block: block.is_deposit_block,
            deposit_tx: block.deposit_tx.clone(),
            txs: block.txs.clone(),
            root,
            num_tokens: block.num_tokens,
            super_root: block.super_root.map(|h| to_hex(&h)),
            timestamp: block.timestamp,
            conf_sigs: block.conf_sig_map.clone(),
        })
    }
}

impl TryFrom<BlockData> for Block {
    type Error = BlockError;

    fn try_from(data: BlockData) -> Result<Self, Self::Error> {
        let mut block = Block::new(data.num_tokens)?;
        block.number = data.number;
        block.timestamp = data.timestamp;
        block.super_root = data
            .super_root
            .as_deref()
            .map(from_hex_array::<32>)
            .transpose()?;
        if let Some(deposit) = data.deposit_tx {
            block.set_deposit_tx(deposit);
        }
        block.is_deposit_block = data.is_deposit_block;
        block.txs = data.txs;
        block.conf_sig_map = data.conf_sigs;
        Ok(block)
    }
}

impl Serialize for Block {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BlockData::try_from(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = BlockData::deserialize(deserializer)?;
        Block::try_from(data).map_err(serde::de::Error::custom)
    }
}
