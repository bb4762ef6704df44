//! # Wallet Tracker
//!
//! Applies chain-watcher events to one wallet: deposits, block headers,
//! full blocks and exits. Events are applied one at a time, in arrival
//! order, either directly through [`WalletTracker::apply`] or by draining a
//! channel with [`WalletTracker::run`].
//!
//! An incoming output is accepted when its replayed history ends in a leaf
//! owned by the wallet that covers it. A history that could not be fully
//! fetched keeps the output unverified. A rejected output never stops the
//! rest of its block.

use crate::application::history_manager::SegmentHistoryManager;
use crate::config::WalletConfig;
use crate::domain::{Exit, HistoryError, WaitingBlock, WalletError, WalletStateManager};
use crate::ports::outbound::{ChainClient, SegmentStore};
use pc_01_segment_state::{
    ExitableRangeManager, LeafState, OwnershipPredicate, PredicatesManager, Segment, StateUpdate,
};
use pc_02_sum_merkle::Block;
use shared_types::{to_hex, Address, Hash};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

/// Inbound chain event.
#[derive(Clone, Debug)]
pub enum WalletEvent {
    /// A deposit was made on the root chain.
    Deposited {
        /// Depositor
        depositor: Address,
        /// Token id
        token_id: u64,
        /// Range start
        start: u64,
        /// Range end
        end: u64,
        /// Deposit block number
        blk_num: u64,
    },
    /// The operator submitted a block root.
    BlockHeaderAdded {
        /// Block number
        blk_num: u64,
        /// Sum-merkle root
        root: Hash,
    },
    /// A full block was downloaded.
    BlockReceived(Block),
    /// An exit was started on the root chain.
    ExitStarted {
        /// Exit id
        exit_id: u64,
        /// Earliest finalization time
        exitable_at: u64,
        /// Exited range
        segment: Segment,
    },
    /// An exit was finalized.
    ExitFinalized {
        /// Token id
        token_id: u64,
        /// Range start
        start: u64,
        /// Range end
        end: u64,
    },
}

/// What changed for the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletNotification {
    /// A deposit was recorded.
    Deposited(StateUpdate),
    /// Wallet leaves were spent by a transaction.
    Sent {
        /// Transaction hash
        tx_hash: Hash,
        /// Output segment
        segment: Segment,
    },
    /// An output with a replayed history now belongs to the wallet.
    Received {
        /// Transaction hash
        tx_hash: Hash,
        /// Output segment
        segment: Segment,
    },
    /// An exit of a wallet leaf started.
    ExitStarted(Exit),
    /// An exit was finalized.
    ExitFinalized {
        /// Token id
        token_id: u64,
        /// Range start
        start: u64,
        /// Range end
        end: u64,
    },
}

/// History key of a state update.
pub fn history_key(state_update: &StateUpdate) -> String {
    to_hex(&state_update.hash())
}

/// Event-driven wallet.
pub struct WalletTracker<S: SegmentStore, C: ChainClient> {
    config: WalletConfig,
    predicates: Arc<PredicatesManager>,
    state: WalletStateManager,
    exitable: ExitableRangeManager,
    history: Arc<SegmentHistoryManager<S, C>>,
    exits: Vec<Exit>,
    loaded_block: u64,
}

impl<S: SegmentStore, C: ChainClient> WalletTracker<S, C> {
    /// Create a tracker for `config.owner`.
    pub fn new(
        config: WalletConfig,
        predicates: Arc<PredicatesManager>,
        history: Arc<SegmentHistoryManager<S, C>>,
    ) -> Self {
        Self {
            config,
            state: WalletStateManager::new(predicates.clone()),
            predicates,
            exitable: ExitableRangeManager::new(),
            history,
            exits: Vec::new(),
            loaded_block: 0,
        }
    }

    /// Wallet leaves.
    pub fn state(&self) -> &WalletStateManager {
        &self.state
    }

    /// Exit-eligible ranges.
    pub fn exitable_ranges(&self) -> &ExitableRangeManager {
        &self.exitable
    }

    /// Started exits.
    pub fn exits(&self) -> &[Exit] {
        &self.exits
    }

    /// Last block applied through `BlockReceived`.
    pub fn loaded_block(&self) -> u64 {
        self.loaded_block
    }

    /// Apply one event.
    pub async fn apply(&mut self, event: WalletEvent) -> Result<Vec<WalletNotification>, WalletError> {
        match event {
            WalletEvent::Deposited {
                depositor,
                token_id,
                start,
                end,
                blk_num,
            } => self.handle_deposit(depositor, token_id, start, end, blk_num).await,
            WalletEvent::BlockHeaderAdded { blk_num, root } => {
                self.history
                    .append_block_header(&WaitingBlock::new(blk_num, root))
                    .await?;
                Ok(Vec::new())
            }
            WalletEvent::BlockReceived(block) => self.handle_block(&block).await,
            WalletEvent::ExitStarted {
                exit_id,
                exitable_at,
                segment,
            } => Ok(self.handle_exit(exit_id, exitable_at, segment)),
            WalletEvent::ExitFinalized {
                token_id,
                start,
                end,
            } => Ok(self.handle_finalized_exit(token_id, start, end)),
        }
    }

    /// Apply events until the sender side closes. Returns the number applied.
    ///
    /// A failing event is logged and skipped.
    pub async fn run(
        &mut self,
        events: mpsc::Receiver<WalletEvent>,
        notifications: mpsc::Sender<WalletNotification>,
    ) -> usize {
        let mut stream = ReceiverStream::new(events);
        let mut applied = 0;
        while let Some(event) = stream.next().await {
            match self.apply(event).await {
                Ok(out) => {
                    applied += 1;
                    for notification in out {
                        if notifications.send(notification).await.is_err() {
                            debug!("[pc-03] notification receiver dropped");
                        }
                    }
                }
                Err(e) => warn!("[pc-03] wallet event failed: {}", e),
            }
        }
        applied
    }

    async fn handle_deposit(
        &mut self,
        depositor: Address,
        token_id: u64,
        start: u64,
        end: u64,
        blk_num: u64,
    ) -> Result<Vec<WalletNotification>, WalletError> {
        let segment = Segment::new(token_id, start, end)?;
        let deposit =
            OwnershipPredicate::create(segment, blk_num, self.config.ownership_predicate, depositor);
        if depositor == self.config.owner {
            self.history.init(&history_key(&deposit), segment);
            self.state.insert_deposit_tx(deposit.clone());
        }
        self.history.append_deposit(&deposit).await?;
        self.exitable.insert(token_id, start, end);
        Ok(vec![WalletNotification::Deposited(deposit)])
    }

    async fn handle_block(&mut self, block: &Block) -> Result<Vec<WalletNotification>, WalletError> {
        for utxo in self.state.utxos().to_vec() {
            let segmented_block = block.get_segmented_block(&utxo.segment())?;
            self.history
                .append_segmented_block(&history_key(utxo.output()), &segmented_block)
                .await?;
        }

        let owner = self.config.owner;
        let mut notifications = Vec::new();
        for tx in block.get_user_transaction_and_proofs(&owner, &self.predicates)? {
            let segment = tx.segment();
            if !self.state.spend(&tx).is_empty() {
                notifications.push(WalletNotification::Sent {
                    tx_hash: tx.tx_hash(),
                    segment,
                });
            }
            if tx.output().is_owned_by(&owner, &self.predicates) {
                let key = history_key(tx.output());
                self.history.init(&key, segment);
                let report = match self.history.verify_history(&key).await {
                    Ok(report) => report,
                    Err(HistoryError::Store(e)) => return Err(HistoryError::Store(e).into()),
                    Err(e) => {
                        warn!("[pc-03] output {} rejected: {}", segment, e);
                        continue;
                    }
                };
                let owned = report.leaves.iter().any(|leaf| {
                    leaf.segment.contains(&segment) && leaf.is_owned_by(&owner, &self.predicates)
                });
                if !owned && report.is_complete() {
                    warn!("[pc-03] history of {} does not end with us, output not accepted", segment);
                    continue;
                }
                let tx_hash = tx.tx_hash();
                if self.state.insert(tx.with_verified(owned && report.is_complete())) {
                    notifications.push(WalletNotification::Received { tx_hash, segment });
                }
            }
        }
        self.loaded_block = block.number();
        debug!(
            "[pc-03] block {} applied, {} notifications",
            block.number(),
            notifications.len()
        );
        Ok(notifications)
    }

    fn handle_exit(&mut self, exit_id: u64, exitable_at: u64, segment: Segment) -> Vec<WalletNotification> {
        let Some(utxo) = self.state.find(&segment).cloned() else {
            debug!("[pc-03] exit {} is not ours", exit_id);
            return Vec::new();
        };
        self.state.start_exit(&segment);
        let exit = Exit {
            id: exit_id,
            exitable_at,
            segment,
            state_bytes: utxo.output().encode(),
        };
        self.exits.push(exit.clone());
        vec![WalletNotification::ExitStarted(exit)]
    }

    fn handle_finalized_exit(&mut self, token_id: u64, start: u64, end: u64) -> Vec<WalletNotification> {
        if let Err(e) = self.exitable.remove(token_id, start, end) {
            warn!("[pc-03] finalized exit outside exitable ranges: {}", e);
        }
        vec![WalletNotification::ExitFinalized { token_id, start, end }]
    }
}
