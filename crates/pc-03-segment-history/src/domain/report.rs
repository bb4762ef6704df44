//! Outcomes of history walks and exits.

use pc_01_segment_state::{Segment, StateUpdate};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Result of replaying one segment history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    /// History key.
    pub key: String,
    /// Leaves of the replay engine after the last window.
    pub leaves: Vec<StateUpdate>,
    /// Transaction blocks whose proofs checked out.
    pub verified_blocks: Vec<u64>,
    /// Transaction blocks with no usable data after the refetch budget.
    pub unverified_blocks: Vec<u64>,
}

impl HistoryReport {
    /// Every transaction block was verified.
    pub fn is_complete(&self) -> bool {
        self.unverified_blocks.is_empty()
    }

    /// Leaves within `segment`.
    pub fn leaves_in<'a>(&'a self, segment: &'a Segment) -> impl Iterator<Item = &'a StateUpdate> + 'a {
        self.leaves.iter().filter(move |l| segment.contains(&l.segment))
    }
}

/// An exit started for one of the wallet's leaves.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exit {
    /// Exit id on the root chain.
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    /// Unix time (seconds) after which the exit can be finalized.
    #[serde_as(as = "DisplayFromStr")]
    pub exitable_at: u64,
    /// Exited range.
    pub segment: Segment,
    /// Encoded state update being exited.
    #[serde(with = "shared_types::hex_bytes")]
    pub state_bytes: Vec<u8>,
}

impl Exit {
    /// Exited amount.
    pub fn amount(&self) -> u64 {
        self.segment.amount()
    }
}
