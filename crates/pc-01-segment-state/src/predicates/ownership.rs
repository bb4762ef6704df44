//! Ownership predicate: one owner, deprecated by the owner's signature.

use crate::domain::{Segment, SegmentStateError, StateUpdate};
use shared_crypto::recover_address;
use shared_types::{address_word, decode_words, encode_words, word_address, Address, Hash};

const SIGNATURE_LENGTH: usize = 65;

/// Ownership predicate behaviour.
pub struct OwnershipPredicate;

impl OwnershipPredicate {
    /// Registry name.
    pub const NAME: &'static str = "OwnershipPredicate";

    /// State update giving `segment` to `owner`.
    pub fn create(segment: Segment, blk_num: u64, predicate: Address, owner: Address) -> StateUpdate {
        StateUpdate::new(segment, blk_num, predicate, encode_words(&[address_word(&owner)]))
    }

    /// Owner encoded in `state`.
    pub fn owner(state: &[u8]) -> Result<Address, SegmentStateError> {
        let words = decode_words(state)?;
        words
            .first()
            .map(word_address)
            .ok_or_else(|| SegmentStateError::InvalidState("ownership state is empty".to_string()))
    }

    /// `next` must lie inside `current` and some signature in `witness`
    /// must recover to the current owner.
    pub fn verify_deprecation(
        hash: &Hash,
        current: &StateUpdate,
        witness: &[u8],
        next: &StateUpdate,
    ) -> Result<bool, SegmentStateError> {
        if witness.is_empty() || witness.len() % SIGNATURE_LENGTH != 0 {
            return Err(SegmentStateError::InvalidWitness(witness.len()));
        }
        let owner = Self::owner(&current.state)?;
        let is_contain = current.segment.contains(&next.segment);
        let is_correct_sig = witness
            .chunks(SIGNATURE_LENGTH)
            .any(|sig| recover_address(hash, sig).map(|a| a == owner).unwrap_or(false));
        Ok(is_contain && is_correct_sig)
    }

    /// Is `owner` the owner named in `state_update`?
    pub fn is_owned_by(owner: &Address, state_update: &StateUpdate) -> bool {
        Self::owner(&state_update.state)
            .map(|o| &o == owner)
            .unwrap_or(false)
    }
}
