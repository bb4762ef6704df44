//! Header index records: what happened at each block number.

use pc_01_segment_state::StateUpdate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::Hash;

/// A published transaction block awaiting verification.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingBlock {
    /// Block number.
    #[serde_as(as = "DisplayFromStr")]
    pub blk_num: u64,
    /// Sum-merkle root committed on chain.
    #[serde(with = "shared_types::hex_array")]
    pub root: Hash,
}

impl WaitingBlock {
    /// New header for block `blk_num`.
    pub fn new(blk_num: u64, root: Hash) -> Self {
        Self { blk_num, root }
    }
}

/// One entry of the header index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlasmaBlockHeader {
    /// A deposit, trusted as the start of a history.
    #[serde(rename = "D")]
    Deposit {
        /// The deposited state.
        deposit: StateUpdate,
    },
    /// A transaction block.
    #[serde(rename = "B")]
    TxBlock(WaitingBlock),
}

impl PlasmaBlockHeader {
    /// Block number the record is indexed under.
    pub fn blk_num(&self) -> u64 {
        match self {
            PlasmaBlockHeader::Deposit { deposit } => deposit.blk_num,
            PlasmaBlockHeader::TxBlock(block) => block.blk_num,
        }
    }

    /// Is this a deposit record?
    pub fn is_deposit(&self) -> bool {
        matches!(self, PlasmaBlockHeader::Deposit { .. })
    }
}
