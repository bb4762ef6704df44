//! # Segment History Manager
//!
//! Registry of segment histories plus the replaying verifier.
//!
//! ## Walk
//!
//! `verify_history` replays the header index from block 0 in windows of
//! `window_size` blocks onto a fresh state engine. Deposits are trusted;
//! transaction blocks are replayed through [`SegmentHistory::verify`]. The
//! walk stops at the first empty window.
//!
//! ## Refetch policy
//!
//! | Failure | Action |
//! |---------|--------|
//! | missing or corrupted local proof | refetch, then retry |
//! | proof does not check against header | refetch, then retry |
//! | budget spent, fresh data never arrived | block reported unverified |
//! | budget spent, fresh data still fails | `InvalidHistory` |
//! | transition not contained | `InvalidHistory` immediately |

use crate::application::segment_history::SegmentHistory;
use crate::config::HistoryConfig;
use crate::domain::{
    ChainClientError, HistoryError, HistoryReport, PlasmaBlockHeader, StoreError, WaitingBlock,
};
use crate::ports::outbound::{ChainClient, SegmentStore};
use parking_lot::{Mutex, RwLock};
use pc_01_segment_state::{PredicatesManager, Segment, StateManager, StateUpdate};
use pc_02_sum_merkle::SegmentedBlock;
use pc_telemetry::{
    metric_inc, HistogramTimer, HISTORY_BLOCKS_UNVERIFIED, HISTORY_BLOCKS_VERIFIED,
    HISTORY_REFETCHES, HISTORY_VERIFICATIONS, HISTORY_VERIFICATION_DURATION,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

enum BlockOutcome {
    Verified,
    Unverified,
}

/// Manager of every tracked segment history.
pub struct SegmentHistoryManager<S: SegmentStore, C: ChainClient> {
    config: HistoryConfig,
    store: Arc<S>,
    client: Arc<C>,
    predicates: Arc<PredicatesManager>,
    histories: RwLock<HashMap<String, SegmentHistory>>,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: SegmentStore, C: ChainClient> SegmentHistoryManager<S, C> {
    /// Create a manager over `store`, refetching from `client`.
    pub fn new(
        config: HistoryConfig,
        store: Arc<S>,
        client: Arc<C>,
        predicates: Arc<PredicatesManager>,
    ) -> Self {
        Self {
            config,
            store,
            client,
            predicates,
            histories: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Proof store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register (or re-register) the history of `original_segment` under `key`.
    pub fn init(&self, key: &str, original_segment: Segment) {
        self.histories
            .write()
            .insert(key.to_string(), SegmentHistory::new(key, original_segment));
    }

    /// Is `key` registered?
    pub fn contains_key(&self, key: &str) -> bool {
        self.histories.read().contains_key(key)
    }

    fn history(&self, key: &str) -> Option<SegmentHistory> {
        self.histories.read().get(key).cloned()
    }

    /// Record a deposit header.
    pub async fn append_deposit(&self, deposit: &StateUpdate) -> Result<(), HistoryError> {
        let header = PlasmaBlockHeader::Deposit {
            deposit: deposit.clone(),
        };
        self.write_header(&header).await
    }

    /// Record a transaction block header.
    pub async fn append_block_header(&self, header: &WaitingBlock) -> Result<(), HistoryError> {
        self.write_header(&PlasmaBlockHeader::TxBlock(header.clone()))
            .await
    }

    async fn write_header(&self, header: &PlasmaBlockHeader) -> Result<(), HistoryError> {
        let serialized = serde_json::to_string(header).map_err(StoreError::from)?;
        self.store
            .add_block_header(header.blk_num(), serialized)
            .await?;
        Ok(())
    }

    /// Store a segmented block under `key`, registering unknown keys.
    pub async fn append_segmented_block(
        &self,
        key: &str,
        segmented_block: &SegmentedBlock,
    ) -> Result<(), HistoryError> {
        let history = match self.history(key) {
            Some(history) => history,
            None => {
                self.init(key, segmented_block.original_segment);
                SegmentHistory::new(key, segmented_block.original_segment)
            }
        };
        history.append(self.store.as_ref(), segmented_block).await
    }

    /// Headers recorded for blocks in `[from, to)`.
    pub async fn load_block_headers(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<PlasmaBlockHeader>, HistoryError> {
        self.store
            .search_block_header(from, to)
            .await?
            .into_iter()
            .map(|(blk_num, serialized)| {
                serde_json::from_str(&serialized).map_err(|e| {
                    HistoryError::CorruptedRecord(format!("header at block {}: {}", blk_num, e))
                })
            })
            .collect()
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.key_locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Replay the history of `key` from its deposit.
    pub async fn verify_history(&self, key: &str) -> Result<HistoryReport, HistoryError> {
        let history = self
            .history(key)
            .ok_or_else(|| HistoryError::UnknownKey(key.to_string()))?;
        let lock = self.key_lock(key);
        let _guard = lock.lock().await;
        let _timer = HistogramTimer::new(&HISTORY_VERIFICATION_DURATION);
        let run_id = Uuid::new_v4();

        debug!("[pc-03] run {} verifying {}", run_id, key);
        match self.load_and_verify(&history, run_id).await {
            Ok(report) => {
                let outcome = if report.is_complete() { "verified" } else { "partial" };
                metric_inc!(HISTORY_VERIFICATIONS, &[outcome]);
                info!(
                    "[pc-03] run {} {}: {} leaves, {} verified, {} unverified blocks",
                    run_id,
                    outcome,
                    report.leaves.len(),
                    report.verified_blocks.len(),
                    report.unverified_blocks.len()
                );
                Ok(report)
            }
            Err(e) => {
                metric_inc!(HISTORY_VERIFICATIONS, &["invalid"]);
                error!("[pc-03] run {} rejected history {}: {}", run_id, key, e);
                Err(e)
            }
        }
    }

    async fn load_and_verify(
        &self,
        history: &SegmentHistory,
        run_id: Uuid,
    ) -> Result<HistoryReport, HistoryError> {
        let window = self.config.window_size.max(1);
        let mut engine = StateManager::new(self.predicates.clone());
        let mut verified_blocks = Vec::new();
        let mut unverified_blocks = Vec::new();
        let mut from = 0u64;

        loop {
            let to = from.saturating_add(window);
            let headers = self.load_block_headers(from, to).await?;
            if headers.is_empty() {
                break;
            }
            for header in headers {
                match header {
                    PlasmaBlockHeader::Deposit { deposit } => {
                        engine.insert_deposit_tx(deposit);
                    }
                    PlasmaBlockHeader::TxBlock(block) => {
                        match self.verify_block(history, &mut engine, &block, run_id).await? {
                            BlockOutcome::Verified => {
                                HISTORY_BLOCKS_VERIFIED.inc();
                                verified_blocks.push(block.blk_num);
                            }
                            BlockOutcome::Unverified => {
                                HISTORY_BLOCKS_UNVERIFIED.inc();
                                unverified_blocks.push(block.blk_num);
                            }
                        }
                    }
                }
            }
            if to == u64::MAX {
                break;
            }
            from = to;
        }

        Ok(HistoryReport {
            key: history.key().to_string(),
            leaves: engine.state_updates().to_vec(),
            verified_blocks,
            unverified_blocks,
        })
    }

    async fn verify_block(
        &self,
        history: &SegmentHistory,
        engine: &mut StateManager,
        header: &WaitingBlock,
        run_id: Uuid,
    ) -> Result<BlockOutcome, HistoryError> {
        let blk_num = header.blk_num;
        let mut refetches = 0u32;
        let mut fresh = false;

        loop {
            let mut scratch = engine.clone();
            let err = match history
                .verify(self.store.as_ref(), &mut scratch, blk_num, &header.root)
                .await
            {
                Ok(()) => {
                    *engine = scratch;
                    return Ok(BlockOutcome::Verified);
                }
                Err(e) if e.is_structural() => return Err(e),
                Err(e) => e,
            };

            if refetches >= self.config.max_refetch_attempts {
                if fresh && matches!(err, HistoryError::ProofCheckFailed { .. }) {
                    return Err(HistoryError::InvalidHistory {
                        blk_num,
                        reason: format!("committed root disagrees with chain data: {}", err),
                    });
                }
                warn!(
                    "[pc-03] run {} leaving block {} unverified: {}",
                    run_id, blk_num, err
                );
                return Ok(BlockOutcome::Unverified);
            }

            refetches += 1;
            warn!(
                "[pc-03] run {} refetching block {} ({}/{}): {}",
                run_id, blk_num, refetches, self.config.max_refetch_attempts, err
            );
            match self.client.get_block(blk_num).await {
                Ok(block) => match block.get_segmented_block(&history.original_segment()) {
                    Ok(segmented_block) => {
                        history.append(self.store.as_ref(), &segmented_block).await?;
                        metric_inc!(HISTORY_REFETCHES, &["ok"]);
                        fresh = true;
                    }
                    Err(e) => {
                        metric_inc!(HISTORY_REFETCHES, &["transport"]);
                        warn!("[pc-03] block {} unusable: {}", blk_num, e);
                    }
                },
                Err(ChainClientError::NotFound(_)) => {
                    metric_inc!(HISTORY_REFETCHES, &["not_found"]);
                }
                Err(e) => {
                    metric_inc!(HISTORY_REFETCHES, &["transport"]);
                    warn!("[pc-03] block {} fetch failed: {}", blk_num, e);
                }
            }
        }
    }
}
