//! Closed set of predicate behaviours known to the client.

use super::ownership::OwnershipPredicate;
use super::payment_channel::PaymentChannelPredicate;
use crate::domain::{SegmentStateError, StateUpdate};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// Native predicate kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativePredicate {
    /// Single-owner state
    Ownership,
    /// Two-party channel state
    PaymentChannel,
}

impl NativePredicate {
    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            NativePredicate::Ownership => OwnershipPredicate::NAME,
            NativePredicate::PaymentChannel => PaymentChannelPredicate::NAME,
        }
    }

    /// Look up a kind by registry name.
    pub fn from_name(name: &str) -> Result<Self, SegmentStateError> {
        match name {
            OwnershipPredicate::NAME => Ok(NativePredicate::Ownership),
            PaymentChannelPredicate::NAME => Ok(NativePredicate::PaymentChannel),
            other => Err(SegmentStateError::UnknownPredicateName(other.to_string())),
        }
    }

    /// Dispatch a deprecation check.
    pub fn verify_deprecation(
        &self,
        hash: &Hash,
        current: &StateUpdate,
        witness: &[u8],
        next: &StateUpdate,
    ) -> Result<bool, SegmentStateError> {
        match self {
            NativePredicate::Ownership => {
                OwnershipPredicate::verify_deprecation(hash, current, witness, next)
            }
            NativePredicate::PaymentChannel => {
                PaymentChannelPredicate::verify_deprecation(hash, current, witness, next)
            }
        }
    }

    /// Dispatch an ownership check.
    pub fn is_owned_by(&self, owner: &Address, state_update: &StateUpdate) -> bool {
        match self {
            NativePredicate::Ownership => OwnershipPredicate::is_owned_by(owner, state_update),
            NativePredicate::PaymentChannel => {
                PaymentChannelPredicate::is_owned_by(owner, state_update)
            }
        }
    }
}
