//! # Predicates Manager
//!
//! Registry from predicate contract address to native behaviour.
//! Checks against an unregistered address report `false`.

use super::native::NativePredicate;
use crate::domain::{SegmentStateError, StateUpdate};
use shared_types::{to_hex, Address, Hash};
use std::collections::HashMap;
use tracing::warn;

/// Address → behaviour registry.
#[derive(Clone, Debug, Default)]
pub struct PredicatesManager {
    predicates: HashMap<Address, NativePredicate>,
    name_to_address: HashMap<&'static str, Address>,
}

impl PredicatesManager {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` as an instance of `predicate`.
    pub fn add_predicate(&mut self, address: Address, predicate: NativePredicate) {
        self.predicates.insert(address, predicate);
        self.name_to_address.insert(predicate.name(), address);
    }

    /// Register by name.
    pub fn add_predicate_by_name(&mut self, address: Address, name: &str) -> Result<(), SegmentStateError> {
        let predicate = NativePredicate::from_name(name)?;
        self.add_predicate(address, predicate);
        Ok(())
    }

    /// Address registered under `name`.
    pub fn get_native_predicate(&self, name: &str) -> Result<Address, SegmentStateError> {
        self.name_to_address
            .get(name)
            .copied()
            .ok_or_else(|| SegmentStateError::UnknownPredicateName(name.to_string()))
    }

    /// Behaviour registered at `address`.
    pub fn predicate_at(&self, address: &Address) -> Option<NativePredicate> {
        self.predicates.get(address).copied()
    }

    /// Run the deprecation check of `current.predicate`.
    pub fn verify_deprecation(
        &self,
        hash: &Hash,
        current: &StateUpdate,
        witness: &[u8],
        next: &StateUpdate,
    ) -> bool {
        let Some(predicate) = self.predicate_at(&current.predicate) else {
            return false;
        };
        match predicate.verify_deprecation(hash, current, witness, next) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "[pc-01] can't verify deprecation with {} at {}: {}",
                    predicate.name(),
                    to_hex(&current.predicate),
                    e
                );
                false
            }
        }
    }

    /// Is `owner` an owner of `state_update` under its predicate?
    pub fn is_owned_by(&self, owner: &Address, state_update: &StateUpdate) -> bool {
        self.predicate_at(&state_update.predicate)
            .map(|p| p.is_owned_by(owner, state_update))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Segment;
    use crate::predicates::OwnershipPredicate;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::keccak256;

    const OWNERSHIP: Address = [0xaa; 20];

    fn manager() -> PredicatesManager {
        let mut m = PredicatesManager::new();
        m.add_predicate(OWNERSHIP, NativePredicate::Ownership);
        m
    }

    #[test]
    fn test_name_lookup() {
        let m = manager();
        assert_eq!(m.get_native_predicate("OwnershipPredicate"), Ok(OWNERSHIP));
        assert!(m.get_native_predicate("PaymentChannelPredicate").is_err());
    }

    #[test]
    fn test_add_by_name_rejects_unknown() {
        let mut m = PredicatesManager::new();
        assert!(m.add_predicate_by_name([1; 20], "Unknown").is_err());
        assert!(m.add_predicate_by_name([1; 20], "PaymentChannelPredicate").is_ok());
        assert_eq!(m.predicate_at(&[1; 20]), Some(NativePredicate::PaymentChannel));
    }

    #[test]
    fn test_dispatch_and_unknown_address() {
        let m = manager();
        let alice = Secp256k1KeyPair::generate();
        let hash = keccak256(b"tx");
        let sig = alice.sign_hash(&hash).unwrap();
        let seg = Segment::eth(0, 10).unwrap();

        let known = OwnershipPredicate::create(seg, 1, OWNERSHIP, alice.address());
        assert!(m.verify_deprecation(&hash, &known, sig.as_bytes(), &known));
        assert!(m.is_owned_by(&alice.address(), &known));

        let unknown = OwnershipPredicate::create(seg, 1, [0xcc; 20], alice.address());
        assert!(!m.verify_deprecation(&hash, &unknown, sig.as_bytes(), &unknown));
        assert!(!m.is_owned_by(&alice.address(), &unknown));
    }

    #[test]
    fn test_predicate_error_degrades_to_false() {
        let m = manager();
        let su = OwnershipPredicate::create(Segment::eth(0, 10).unwrap(), 1, OWNERSHIP, [1; 20]);
        assert!(!m.verify_deprecation(&[0; 32], &su, &[1, 2, 3], &su));
    }
}
