//! # State Update
//!
//! "As of block `blk_num`, `segment` is governed by `predicate` with `state`."
//!
//! ## Encodings
//!
//! - On-chain: `predicate(32) ‖ blkNum(32) ‖ segment(32) ‖ state`, words left-padded
//! - Storage: RLP list `[segment big number, blkNum, predicate, state]`, hex in JSON

use super::errors::SegmentStateError;
use super::segment::Segment;
use crate::predicates::PredicatesManager;
use primitive_types::U256;
use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use shared_types::{
    address_word, from_hex, keccak256, to_hex, u256_word, u64_word, word_address, Address,
    DecodeError, Hash, WORD_SIZE,
};

/// A claim of ownership over one segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StateUpdate {
    /// Governed range.
    pub segment: Segment,
    /// Block in which this update became valid.
    pub blk_num: u64,
    /// Address of the predicate contract deciding deprecation.
    pub predicate: Address,
    /// Predicate-specific state (32-byte words).
    pub state: Vec<u8>,
}

impl StateUpdate {
    /// Create a state update.
    pub fn new(segment: Segment, blk_num: u64, predicate: Address, state: Vec<u8>) -> Self {
        Self {
            segment,
            blk_num,
            predicate,
            state,
        }
    }

    /// Canonical on-chain encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 * WORD_SIZE + self.state.len());
        out.extend_from_slice(&address_word(&self.predicate));
        out.extend_from_slice(&u64_word(self.blk_num));
        out.extend_from_slice(&u256_word(self.segment.to_big_number()));
        out.extend_from_slice(&self.state);
        out
    }

    /// Keccak-256 of [`StateUpdate::encode`].
    pub fn hash(&self) -> Hash {
        keccak256(&self.encode())
    }

    /// Storage form (RLP).
    pub fn to_rlp(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(4);
        stream.append(&self.segment.to_big_number());
        stream.append(&self.blk_num);
        stream.append(&self.predicate.to_vec());
        stream.append(&self.state);
        stream.out().to_vec()
    }

    /// Decode the storage form.
    pub fn from_rlp(bytes: &[u8]) -> Result<Self, SegmentStateError> {
        let rlp = Rlp::new(bytes);
        let count = rlp.item_count()?;
        if count != 4 {
            return Err(DecodeError::InvalidLength {
                expected: 4,
                actual: count,
            }
            .into());
        }
        let segment = Segment::from_big_number(rlp.val_at::<U256>(0)?)?;
        let blk_num: u64 = rlp.val_at(1)?;
        let predicate_bytes: Vec<u8> = rlp.val_at(2)?;
        if predicate_bytes.len() != 20 {
            return Err(DecodeError::InvalidLength {
                expected: 20,
                actual: predicate_bytes.len(),
            }
            .into());
        }
        let mut predicate = [0u8; 20];
        predicate.copy_from_slice(&predicate_bytes);
        let state: Vec<u8> = rlp.val_at(3)?;
        Ok(Self::new(segment, blk_num, predicate, state))
    }

    /// Storage form as `0x` hex.
    pub fn serialize(&self) -> String {
        to_hex(&self.to_rlp())
    }

    /// Parse [`StateUpdate::serialize`] output.
    pub fn deserialize(data: &str) -> Result<Self, SegmentStateError> {
        Self::from_rlp(&from_hex(data)?)
    }

    /// The same claim restricted to `segment`, when this update covers it.
    pub fn get_sub_state_update(&self, segment: &Segment) -> StateUpdate {
        if self.segment.contains(segment) {
            StateUpdate::new(*segment, self.blk_num, self.predicate, self.state.clone())
        } else {
            self.clone()
        }
    }

    /// Pieces of this update left after removing `consumed`.
    pub fn get_remaining_state(&self, consumed: &Segment) -> Vec<StateUpdate> {
        self.segment
            .sub(consumed)
            .into_iter()
            .map(|s| StateUpdate::new(s, self.blk_num, self.predicate, self.state.clone()))
            .collect()
    }

    /// Does `next` validly deprecate this update under its predicate?
    ///
    /// Predicate errors and unknown predicates count as `false`.
    pub fn verify_deprecation(
        &self,
        hash: &Hash,
        next: &StateUpdate,
        witness: &[u8],
        predicates: &PredicatesManager,
    ) -> bool {
        predicates.verify_deprecation(hash, self, witness, next)
    }

    /// Ownership check through the predicate registry.
    pub fn is_owned_by(&self, owner: &Address, predicates: &PredicatesManager) -> bool {
        predicates.is_owned_by(owner, self)
    }

    /// Address held in the first state word, if any.
    pub fn owner(&self) -> Option<Address> {
        if self.state.len() < WORD_SIZE {
            return None;
        }
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&self.state[..WORD_SIZE]);
        Some(word_address(&word))
    }
}

impl From<StateUpdate> for String {
    fn from(s: StateUpdate) -> Self {
        s.serialize()
    }
}

impl TryFrom<String> for StateUpdate {
    type Error = SegmentStateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        StateUpdate::deserialize(&s)
    }
}
