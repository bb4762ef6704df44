//! # Outbound Ports
//!
//! Traits for external dependencies: the operator's chain API and the
//! persistent proof store.

use crate::domain::{ChainClientError, StoreError};
use async_trait::async_trait;
use pc_01_segment_state::SignedTransaction;
use pc_02_sum_merkle::{Block, SignedTransactionWithProof};

/// Operator chain API - outbound port.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch a full block.
    async fn get_block(&self, blk_num: u64) -> Result<Block, ChainClientError>;

    /// Proven outputs of the caller's transactions in block `blk_num`.
    async fn get_user_transactions(
        &self,
        blk_num: u64,
    ) -> Result<Vec<SignedTransactionWithProof>, ChainClientError>;

    /// Submit a transaction. Returns whether the operator accepted it.
    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<bool, ChainClientError>;
}

/// Proof and header storage - outbound port.
///
/// Every write is a single atomic record; readers never see a partial one.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Store the serialized segmented block for (key, block).
    async fn add_proof(&self, key: &str, blk_num: u64, serialized: String) -> Result<(), StoreError>;

    /// Serialized segmented block for (key, block), if any.
    async fn get_proof(&self, key: &str, blk_num: u64) -> Result<Option<String>, StoreError>;

    /// Store the serialized header for a block.
    async fn add_block_header(&self, blk_num: u64, serialized: String) -> Result<(), StoreError>;

    /// Headers with block number in `[from, to)`, ascending.
    async fn search_block_header(&self, from: u64, to: u64) -> Result<Vec<(u64, String)>, StoreError>;
}
