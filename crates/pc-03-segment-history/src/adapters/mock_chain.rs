//! Chain client serving preloaded blocks, with failure injection.

use crate::domain::ChainClientError;
use crate::ports::outbound::ChainClient;
use async_trait::async_trait;
use parking_lot::RwLock;
use pc_01_segment_state::SignedTransaction;
use pc_02_sum_merkle::{Block, SignedTransactionWithProof};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// In-process chain client.
#[derive(Debug, Default)]
pub struct MockChainClient {
    blocks: RwLock<HashMap<u64, Block>>,
    failure: RwLock<Option<ChainClientError>>,
    sent: RwLock<Vec<SignedTransaction>>,
    fetches: AtomicUsize,
}

impl MockChainClient {
    /// Client with no blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `block` under its number.
    pub fn insert_block(&self, block: Block) {
        self.blocks.write().insert(block.number(), block);
    }

    /// Fail every request with `error`, or stop failing with `None`.
    pub fn set_failure(&self, error: Option<ChainClientError>) {
        *self.failure.write() = error;
    }

    /// Number of `get_block` calls served or refused.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Transactions received through `send_transaction`.
    pub fn sent_transactions(&self) -> Vec<SignedTransaction> {
        self.sent.read().clone()
    }

    fn check_failure(&self) -> Result<(), ChainClientError> {
        match self.failure.read().as_ref() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_block(&self, blk_num: u64) -> Result<Block, ChainClientError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        debug!("[pc-03] mock chain serving block {}", blk_num);
        self.blocks
            .read()
            .get(&blk_num)
            .cloned()
            .ok_or(ChainClientError::NotFound(blk_num))
    }

    /// Every transaction of the block; the mock does not filter by caller.
    async fn get_user_transactions(
        &self,
        blk_num: u64,
    ) -> Result<Vec<SignedTransactionWithProof>, ChainClientError> {
        let block = self.get_block(blk_num).await?;
        let mut out = Vec::new();
        for tx in block.txs() {
            let proven = block
                .get_signed_transaction_with_proof(&tx.tx_hash())
                .map_err(|e| ChainClientError::Transport(e.to_string()))?;
            out.extend(proven);
        }
        Ok(out)
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<bool, ChainClientError> {
        self.check_failure()?;
        self.sent.write().push(tx.clone());
        Ok(true)
    }
}
