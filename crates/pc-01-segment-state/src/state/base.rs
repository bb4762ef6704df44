//! # Base State Manager
//!
//! The live leaf set: non-overlapping states sorted by segment start.
//!
//! ## Deprecation rule
//!
//! An update deprecates the leaves it hits only if **every** hit leaf accepts
//! the update restricted to their overlap, and at least one leaf is hit.
//! Spent leaves are replaced by their unconsumed remainder (0, 1 or 2 pieces).

use crate::domain::{Segment, StateUpdate};
use crate::predicates::PredicatesManager;
use shared_types::Hash;
use std::sync::Arc;
use tracing::debug;

/// A state the engine can hold as a leaf.
pub trait LeafState: Clone {
    /// Range governed by this leaf.
    fn segment(&self) -> Segment;

    /// Does `next` deprecate this leaf under `witness`?
    fn verify_deprecation(
        &self,
        hash: &Hash,
        next: &StateUpdate,
        witness: &[u8],
        predicates: &PredicatesManager,
    ) -> bool;

    /// Leaves left after `consumed` is removed from this one.
    fn get_remaining_state(&self, consumed: &Segment) -> Vec<Self>;

    /// The underlying update restricted to `segment`.
    fn get_sub_state_update(&self, segment: &Segment) -> StateUpdate;

    /// Identity hash.
    fn state_hash(&self) -> Hash;

    /// Predicate state bytes.
    fn raw_state(&self) -> &[u8];
}

impl LeafState for StateUpdate {
    fn segment(&self) -> Segment {
        self.segment
    }

    fn verify_deprecation(
        &self,
        hash: &Hash,
        next: &StateUpdate,
        witness: &[u8],
        predicates: &PredicatesManager,
    ) -> bool {
        StateUpdate::verify_deprecation(self, hash, next, witness, predicates)
    }

    fn get_remaining_state(&self, consumed: &Segment) -> Vec<Self> {
        StateUpdate::get_remaining_state(self, consumed)
    }

    fn get_sub_state_update(&self, segment: &Segment) -> StateUpdate {
        StateUpdate::get_sub_state_update(self, segment)
    }

    fn state_hash(&self) -> Hash {
        self.hash()
    }

    fn raw_state(&self) -> &[u8] {
        &self.state
    }
}

/// Ordered leaf set plus the predicate registry used to check deprecation.
#[derive(Clone, Debug)]
pub struct BaseStateManager<L: LeafState> {
    predicates: Arc<PredicatesManager>,
    leaves: Vec<L>,
}

impl<L: LeafState> BaseStateManager<L> {
    /// Empty leaf set.
    pub fn new(predicates: Arc<PredicatesManager>) -> Self {
        Self {
            predicates,
            leaves: Vec::new(),
        }
    }

    /// Predicate registry.
    pub fn predicates(&self) -> &Arc<PredicatesManager> {
        &self.predicates
    }

    /// Current leaves, ascending by start.
    pub fn leaves(&self) -> &[L] {
        &self.leaves
    }

    /// Replace every leaf.
    pub fn set_leaves(&mut self, leaves: Vec<L>) {
        self.leaves = leaves;
    }

    /// Would `update` deprecate the leaves it hits?
    pub fn is_contain_update<U: LeafState>(&self, hash: &Hash, update: &U, witness: &[u8]) -> bool {
        let targets = self.targets(&update.segment());
        self.can_deprecate(&targets, hash, update, witness)
    }

    /// Deprecate the hit leaves and keep their remainders.
    ///
    /// Returns the removed leaves, or nothing (and no change) if any hit
    /// leaf refuses.
    pub fn spend_update<U: LeafState>(&mut self, hash: &Hash, update: &U, witness: &[u8]) -> Vec<L> {
        let targets = self.targets(&update.segment());
        if !self.can_deprecate(&targets, hash, update, witness) {
            return Vec::new();
        }
        let consumed = update.segment();
        let mut removed = Vec::with_capacity(targets.len());
        for index in targets.iter().rev() {
            removed.push(self.leaves.remove(*index));
        }
        removed.reverse();
        for target in &removed {
            for remainder in target.get_remaining_state(&consumed) {
                self.insert_sorted(remainder);
            }
        }
        debug!(
            "[pc-01] spent {} leaves hit by {}",
            removed.len(),
            consumed
        );
        removed
    }

    /// Add a leaf unless an existing leaf already contains its segment.
    pub fn insert_leaf(&mut self, leaf: L) -> bool {
        let segment = leaf.segment();
        if self.leaves.iter().any(|l| l.segment().contains(&segment)) {
            return false;
        }
        self.insert_sorted(leaf);
        true
    }

    /// Drop the leaf whose segment is exactly `segment`.
    pub fn start_exit(&mut self, segment: &Segment) {
        self.leaves.retain(|l| l.segment() != *segment);
    }

    fn targets(&self, range: &Segment) -> Vec<usize> {
        self.leaves
            .iter()
            .enumerate()
            .filter(|(_, l)| range.hits(&l.segment()))
            .map(|(i, _)| i)
            .collect()
    }

    fn can_deprecate<U: LeafState>(
        &self,
        targets: &[usize],
        hash: &Hash,
        update: &U,
        witness: &[u8],
    ) -> bool {
        if targets.is_empty() {
            return false;
        }
        let range = update.segment();
        targets.iter().all(|index| {
            let leaf = &self.leaves[*index];
            match range.intersection(&leaf.segment()) {
                Some(overlap) => leaf.verify_deprecation(
                    hash,
                    &update.get_sub_state_update(&overlap),
                    witness,
                    &self.predicates,
                ),
                None => false,
            }
        })
    }

    fn insert_sorted(&mut self, leaf: L) {
        let start = leaf.segment().start();
        let index = self
            .leaves
            .iter()
            .position(|l| l.segment().start() > start)
            .unwrap_or(self.leaves.len());
        self.leaves.insert(index, leaf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::{NativePredicate, OwnershipPredicate};
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{keccak256, Address};

    const OWNERSHIP: Address = [0xaa; 20];

    fn engine() -> BaseStateManager<StateUpdate> {
        let mut predicates = PredicatesManager::new();
        predicates.add_predicate(OWNERSHIP, NativePredicate::Ownership);
        BaseStateManager::new(Arc::new(predicates))
    }

    fn owned(start: u64, end: u64, owner: Address) -> StateUpdate {
        OwnershipPredicate::create(Segment::eth(start, end).unwrap(), 1, OWNERSHIP, owner)
    }

    #[test]
    fn test_empty_engine_contains_nothing() {
        let alice = Secp256k1KeyPair::generate();
        let update = owned(0, 10, alice.address());
        let hash = keccak256(b"tx");
        let sig = alice.sign_hash(&hash).unwrap();
        // no leaf hit: containment must not be vacuously true
        assert!(!engine().is_contain_update(&hash, &update, sig.as_bytes()));
    }

    #[test]
    fn test_spend_spanning_two_leaves() {
        let alice = Secp256k1KeyPair::generate();
        let mut e = engine();
        assert!(e.insert_leaf(owned(0, 100, alice.address())));
        assert!(e.insert_leaf(owned(100, 200, alice.address())));

        let update = owned(50, 150, [0x22; 20]);
        let hash = keccak256(b"span");
        let sig = alice.sign_hash(&hash).unwrap();
        let removed = e.spend_update(&hash, &update, sig.as_bytes());

        assert_eq!(removed.len(), 2);
        let segments: Vec<Segment> = e.leaves().iter().map(|l| l.segment).collect();
        assert_eq!(
            segments,
            vec![Segment::eth(0, 50).unwrap(), Segment::eth(150, 200).unwrap()]
        );
    }

    #[test]
    fn test_spend_refused_when_one_leaf_foreign() {
        let alice = Secp256k1KeyPair::generate();
        let mut e = engine();
        e.insert_leaf(owned(0, 100, alice.address()));
        e.insert_leaf(owned(100, 200, [0x99; 20]));
        let before = e.leaves().to_vec();

        let update = owned(50, 150, [0x22; 20]);
        let hash = keccak256(b"span");
        let sig = alice.sign_hash(&hash).unwrap();
        assert!(e.spend_update(&hash, &update, sig.as_bytes()).is_empty());
        assert_eq!(e.leaves(), before.as_slice());
    }

    #[test]
    fn test_insert_rejects_superset_holder() {
        let mut e = engine();
        assert!(e.insert_leaf(owned(0, 100, [1; 20])));
        assert!(!e.insert_leaf(owned(10, 20, [1; 20])));
        assert_eq!(e.leaves().len(), 1);
    }

    #[test]
    fn test_start_exit_exact_only() {
        let mut e = engine();
        e.insert_leaf(owned(0, 100, [1; 20]));
        e.start_exit(&Segment::eth(0, 50).unwrap());
        assert_eq!(e.leaves().len(), 1);
        e.start_exit(&Segment::eth(0, 100).unwrap());
        assert!(e.leaves().is_empty());
    }
}
