//! # Merkle Flow
//!
//! Operator side builds and seals a multi-token block; client side receives
//! it as JSON, checks every proof and applies the transactions to its state
//! engine.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use pc_01_segment_state::{OwnershipPredicate, Segment, SignedTransaction, StateManager};
    use pc_02_sum_merkle::{Block, SegmentedBlock, SegmentedBlockItem};
    use proptest::prelude::*;
    use shared_types::TOTAL_AMOUNT;

    fn multi_token_block() -> (Block, Vec<SignedTransaction>) {
        let (alice, bob) = (alice(), bob());
        let swap = {
            let mut tx = SignedTransaction::new(vec![
                OwnershipPredicate::create(Segment::new(0, 0, 500).unwrap(), 4, OWNERSHIP, bob.address()),
                OwnershipPredicate::create(Segment::new(1, 100, 300).unwrap(), 4, OWNERSHIP, alice.address()),
            ]);
            tx.sign(&alice).unwrap();
            tx.sign(&bob).unwrap();
            tx
        };
        let pay = transfer(&bob, eth(1_000, 2_000), 4, alice.address());
        let mut block = Block::new(3).unwrap();
        block.set_block_number(4);
        block.append_tx(swap.clone());
        block.append_tx(pay.clone());
        block.seal(1_700_000_004).unwrap();
        (block, vec![swap, pay])
    }

    #[test]
    fn test_block_survives_json() {
        let (block, txs) = multi_token_block();
        let restored = Block::from_json(&block.to_json().unwrap()).unwrap();
        assert_eq!(restored.get_root().unwrap(), block.get_root().unwrap());
        assert_eq!(restored.verify_super_root(), Ok(true));
        for tx in &txs {
            assert_eq!(
                restored.get_signed_transaction_with_proof(&tx.tx_hash()).unwrap(),
                block.get_signed_transaction_with_proof(&tx.tx_hash()).unwrap()
            );
        }
    }

    #[test]
    fn test_every_output_proven() {
        let (block, txs) = multi_token_block();
        for tx in &txs {
            let proven = block.get_signed_transaction_with_proof(&tx.tx_hash()).unwrap();
            assert_eq!(proven.len(), tx.state_updates.len());
            for (i, item) in proven.iter().enumerate() {
                assert_eq!(item.state_index, i);
                assert!(item.check_inclusion());
                assert_eq!(item.proofs[i].segment, tx.state_updates[i].segment);
                assert!(item.get_proof_as_hex().unwrap().starts_with("0x"));
            }
        }
    }

    #[test]
    fn test_unused_tokens_fully_excluded() {
        let (block, _) = multi_token_block();
        let segmented = block
            .get_segmented_block(&Segment::new(2, 0, TOTAL_AMOUNT).unwrap())
            .unwrap();
        assert_eq!(segmented.items.len(), 1);
        match &segmented.items[0] {
            SegmentedBlockItem::Exclusion(proof) => {
                assert!(proof.check_exclusion());
                assert_eq!(proof.proof.segment, Segment::new(2, 0, TOTAL_AMOUNT).unwrap());
            }
            other => panic!("expected exclusion, got {:?}", other),
        }
    }

    #[test]
    fn test_segmented_block_json() {
        let (block, _) = multi_token_block();
        let segmented = block.get_segmented_block(&eth(0, 3_000)).unwrap();
        let json = serde_json::to_string(&segmented).unwrap();
        let restored: SegmentedBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, segmented);
        // swap output, gap, pay output, tail gap
        assert_eq!(restored.items.len(), 4);
        for item in &restored.items {
            match item {
                SegmentedBlockItem::Inclusion(tx) => assert!(tx.check_inclusion()),
                SegmentedBlockItem::Exclusion(proof) => assert!(proof.check_exclusion()),
            }
        }
    }

    #[test]
    fn test_client_applies_verified_block() {
        let (alice, bob) = (alice(), bob());
        let (block, txs) = multi_token_block();
        let mut engine = StateManager::new(predicates());
        engine.insert_deposit_tx(OwnershipPredicate::create(eth(0, 500), 1, OWNERSHIP, alice.address()));
        engine.insert_deposit_tx(OwnershipPredicate::create(
            Segment::new(1, 100, 300).unwrap(),
            1,
            OWNERSHIP,
            bob.address(),
        ));
        engine.insert_deposit_tx(OwnershipPredicate::create(eth(1_000, 2_000), 2, OWNERSHIP, bob.address()));

        for tx in &txs {
            let proven = block.get_signed_transaction_with_proof(&tx.tx_hash()).unwrap();
            assert!(proven.iter().all(|p| p.check_inclusion()));
            assert!(engine.is_contain(tx));
            assert!(!engine.spend(tx).is_empty());
            assert!(engine.insert(tx).iter().all(|inserted| *inserted));
        }

        let owners: Vec<_> = engine
            .state_updates()
            .iter()
            .map(|s| (s.segment, s.owner()))
            .collect();
        assert!(owners.contains(&(eth(0, 500), Some(bob.address()))));
        assert!(owners.contains(&(Segment::new(1, 100, 300).unwrap(), Some(alice.address()))));
        assert!(owners.contains(&(eth(1_000, 2_000), Some(alice.address()))));
    }

    #[test]
    fn test_operator_confirmation() {
        let (block, txs) = multi_token_block();
        let operator = shared_crypto::Secp256k1KeyPair::generate();
        let mut proven = block.get_signed_transaction_with_proof(&txs[1].tx_hash()).unwrap();
        proven[0].confirm_merkle_proofs(&operator).unwrap();
        let signer = proven[0].conf_sigs[0].recover(&proven[0].merkle_hash()).unwrap();
        assert_eq!(signer, operator.address());
    }

    proptest! {
        #[test]
        fn prop_random_partition_verifies(cuts in proptest::collection::btree_set(1u64..1_000_000, 1..12)) {
            let key = alice();
            let points: Vec<u64> = std::iter::once(0).chain(cuts).collect();
            let mut block = Block::new(1).unwrap();
            // every other piece is an output, the rest stay as gaps
            for (i, pair) in points.windows(2).enumerate() {
                if i % 2 == 0 {
                    block.append_tx(transfer(&key, eth(pair[0], pair[1]), 1, [i as u8; 20]));
                }
            }
            block.seal(1).unwrap();
            let root = block.get_root().unwrap();
            let segmented = block.get_segmented_block(&eth(0, TOTAL_AMOUNT)).unwrap();
            let mut covered = 0u64;
            for item in &segmented.items {
                match item {
                    SegmentedBlockItem::Inclusion(tx) => {
                        prop_assert!(tx.check_inclusion());
                        covered += tx.output().segment.amount();
                    }
                    SegmentedBlockItem::Exclusion(proof) => {
                        prop_assert!(proof.check_exclusion());
                        prop_assert_eq!(proof.root, root);
                        covered += proof.proof.segment.amount();
                    }
                }
            }
            prop_assert_eq!(covered, TOTAL_AMOUNT);
            prop_assert_eq!(block.tree().unwrap().total(), TOTAL_AMOUNT);
        }
    }
}
