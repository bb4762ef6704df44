//! Payment channel predicate: two participants, both must sign.

use crate::domain::{Segment, SegmentStateError, StateUpdate};
use shared_crypto::recover_address;
use shared_types::{
    address_word, decode_words, encode_words, u64_word, word_address, word_u64, Address, Hash,
};

/// Decoded channel state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelState {
    /// Channel commitment hash
    pub hash: Hash,
    /// First participant
    pub participant1: Address,
    /// Second participant
    pub participant2: Address,
    /// Off-chain state index
    pub state_index: u64,
}

impl ChannelState {
    /// Encode as four words.
    pub fn encode(&self) -> Vec<u8> {
        encode_words(&[
            self.hash,
            address_word(&self.participant1),
            address_word(&self.participant2),
            u64_word(self.state_index),
        ])
    }

    /// Decode four words.
    pub fn decode(state: &[u8]) -> Result<Self, SegmentStateError> {
        let words = decode_words(state)?;
        if words.len() != 4 {
            return Err(SegmentStateError::InvalidState(format!(
                "payment channel state has {} words",
                words.len()
            )));
        }
        Ok(Self {
            hash: words[0],
            participant1: word_address(&words[1]),
            participant2: word_address(&words[2]),
            state_index: word_u64(&words[3])?,
        })
    }
}

/// Payment channel predicate behaviour.
pub struct PaymentChannelPredicate;

impl PaymentChannelPredicate {
    /// Registry name.
    pub const NAME: &'static str = "PaymentChannelPredicate";

    /// State update locking `segment` into a channel.
    pub fn create(segment: Segment, blk_num: u64, predicate: Address, channel: &ChannelState) -> StateUpdate {
        StateUpdate::new(segment, blk_num, predicate, channel.encode())
    }

    /// `witness[0..65]` must recover to participant 1 and `witness[65..130]`
    /// to participant 2, and `next` must lie inside `current`.
    pub fn verify_deprecation(
        hash: &Hash,
        current: &StateUpdate,
        witness: &[u8],
        next: &StateUpdate,
    ) -> Result<bool, SegmentStateError> {
        if witness.len() < 130 {
            return Err(SegmentStateError::InvalidWitness(witness.len()));
        }
        let channel = ChannelState::decode(&current.state)?;
        let is_contain = current.segment.contains(&next.segment);
        let sig1 = recover_address(hash, &witness[0..65])? == channel.participant1;
        let sig2 = recover_address(hash, &witness[65..130])? == channel.participant2;
        Ok(is_contain && sig1 && sig2)
    }

    /// Is `owner` one of the participants?
    pub fn is_owned_by(owner: &Address, state_update: &StateUpdate) -> bool {
        ChannelState::decode(&state_update.state)
            .map(|c| &c.participant1 == owner || &c.participant2 == owner)
            .unwrap_or(false)
    }
}
