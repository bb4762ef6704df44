//! # History Replay
//!
//! Segment `[0, 1_000_000)` is deposited to Alice at block 3, moves to Bob
//! at block 6, is untouched at block 8 and returns to Alice at block 10.
//! A second segment `[1_000_000, 2_000_000)` changes hands in parallel so
//! every block carries foreign transactions.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use pc_01_segment_state::{OwnershipPredicate, Segment, StateUpdate};
    use pc_02_sum_merkle::{Block, SegmentedBlockItem};
    use pc_03_segment_history::{ChainClientError, HistoryError, MockChainClient, WaitingBlock};
    use std::sync::Arc;

    const KEY: &str = "segment1";

    struct Scenario {
        segment1: Segment,
        segment2: Segment,
        deposits: Vec<StateUpdate>,
        blocks: Vec<Block>,
    }

    fn scenario() -> Scenario {
        let (alice, bob) = (alice(), bob());
        let segment1 = eth(0, 1_000_000);
        let segment2 = eth(1_000_000, 2_000_000);
        let deposits = vec![
            OwnershipPredicate::create(segment1, 3, OWNERSHIP, alice.address()),
            OwnershipPredicate::create(segment2, 5, OWNERSHIP, bob.address()),
        ];
        let blocks = vec![
            sealed_block(
                6,
                vec![
                    transfer(&alice, segment1, 6, bob.address()),
                    transfer(&bob, segment2, 6, alice.address()),
                ],
            ),
            sealed_block(8, vec![transfer(&alice, segment2, 8, bob.address())]),
            sealed_block(
                10,
                vec![
                    transfer(&bob, segment1, 10, alice.address()),
                    transfer(&alice, segment2, 10, bob.address()),
                ],
            ),
        ];
        Scenario {
            segment1,
            segment2,
            deposits,
            blocks,
        }
    }

    /// Manager with every header recorded; `local` lists the blocks whose
    /// proofs are stored up front.
    async fn prepared(
        s: &Scenario,
        client: Arc<MockChainClient>,
        local: &[u64],
    ) -> TestHistoryManager {
        let manager = history_manager(client);
        for deposit in &s.deposits {
            manager.append_deposit(deposit).await.unwrap();
        }
        for block in &s.blocks {
            manager.append_block_header(&header(block)).await.unwrap();
        }
        manager.init(KEY, s.segment1);
        for block in s.blocks.iter().filter(|b| local.contains(&b.number())) {
            manager
                .append_segmented_block(KEY, &block.get_segmented_block(&s.segment1).unwrap())
                .await
                .unwrap();
        }
        manager
    }

    #[test]
    fn test_block_8_excludes_segment() {
        let s = scenario();
        let segmented = s.blocks[1].get_segmented_block(&s.segment1).unwrap();
        assert_eq!(segmented.items.len(), 1);
        assert!(matches!(segmented.items[0], SegmentedBlockItem::Exclusion(_)));
    }

    #[tokio::test]
    async fn test_end_to_end_history() {
        let s = scenario();
        let manager = prepared(&s, Arc::new(MockChainClient::new()), &[6, 8, 10]).await;

        let report = manager.verify_history(KEY).await.unwrap();
        assert_eq!(report.verified_blocks, vec![6, 8, 10]);
        assert!(report.is_complete());

        let owned: Vec<_> = report.leaves_in(&s.segment1).collect();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].segment, s.segment1);
        assert_eq!(owned[0].blk_num, 10);
        assert_eq!(owned[0].owner(), Some(alice().address()));

        // segment2 was never replayed under this key and stays at its deposit
        let other: Vec<_> = report.leaves_in(&s.segment2).collect();
        assert_eq!(other, vec![&s.deposits[1]]);
    }

    #[tokio::test]
    async fn test_replay_is_deterministic() {
        let s = scenario();
        let manager = prepared(&s, Arc::new(MockChainClient::new()), &[6, 8, 10]).await;
        let first = manager.verify_history(KEY).await.unwrap();
        let second = manager.verify_history(KEY).await.unwrap();
        assert_eq!(first, second);

        let fresh = prepared(&s, Arc::new(MockChainClient::new()), &[6, 8, 10]).await;
        assert_eq!(fresh.verify_history(KEY).await.unwrap().leaves, first.leaves);
    }

    #[tokio::test]
    async fn test_corrupted_header_root_is_fatal() {
        let s = scenario();
        let client = Arc::new(MockChainClient::new());
        for block in &s.blocks {
            client.insert_block(block.clone());
        }
        let manager = prepared(&s, client.clone(), &[6, 8, 10]).await;
        manager
            .append_block_header(&WaitingBlock::new(8, [0xde; 32]))
            .await
            .unwrap();

        let err = manager.verify_history(KEY).await.unwrap_err();
        assert!(matches!(err, HistoryError::InvalidHistory { blk_num: 8, .. }));
        // the default budget was spent on fresh copies of block 8
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_proof_is_refetched() {
        let s = scenario();
        let client = Arc::new(MockChainClient::new());
        client.insert_block(s.blocks[1].clone());
        let manager = prepared(&s, client.clone(), &[6, 10]).await;

        let report = manager.verify_history(KEY).await.unwrap();
        assert_eq!(report.verified_blocks, vec![6, 8, 10]);
        assert_eq!(client.fetch_count(), 1);

        // the fetched proof was persisted; a second walk needs no network
        manager.verify_history(KEY).await.unwrap();
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_block_is_unverified() {
        let s = scenario();
        let client = Arc::new(MockChainClient::new());
        let manager = prepared(&s, client.clone(), &[6, 10]).await;

        let report = manager.verify_history(KEY).await.unwrap();
        assert_eq!(report.unverified_blocks, vec![8]);
        assert_eq!(report.verified_blocks, vec![6, 10]);
        assert_eq!(client.fetch_count(), 2);

        client.set_failure(Some(ChainClientError::Transport("offline".into())));
        let report = manager.verify_history(KEY).await.unwrap();
        assert_eq!(report.unverified_blocks, vec![8]);
    }

    #[tokio::test]
    async fn test_forged_transfer_is_fatal() {
        let s = scenario();
        let mallory = shared_crypto::Secp256k1KeyPair::generate();
        let forged = sealed_block(6, vec![transfer(&mallory, s.segment1, 6, mallory.address())]);

        let manager = history_manager(Arc::new(MockChainClient::new()));
        manager.append_deposit(&s.deposits[0]).await.unwrap();
        manager.append_block_header(&header(&forged)).await.unwrap();
        manager
            .append_segmented_block(KEY, &forged.get_segmented_block(&s.segment1).unwrap())
            .await
            .unwrap();

        let err = manager.verify_history(KEY).await.unwrap_err();
        assert!(matches!(err, HistoryError::InvalidHistory { blk_num: 6, .. }));
    }

    #[tokio::test]
    async fn test_two_token_swap_follows_own_token() {
        let (alice, carol) = (alice(), bob());
        let eth_range = eth(0, 100);
        let token_range = Segment::new(1, 0, 100).unwrap();
        let deposits = [
            OwnershipPredicate::create(eth_range, 3, OWNERSHIP, alice.address()),
            OwnershipPredicate::create(token_range, 4, OWNERSHIP, carol.address()),
        ];

        let mut swap = pc_01_segment_state::SignedTransaction::new(vec![
            OwnershipPredicate::create(eth_range, 6, OWNERSHIP, carol.address()),
            OwnershipPredicate::create(token_range, 6, OWNERSHIP, alice.address()),
        ]);
        swap.sign(&alice).unwrap();
        swap.sign(&carol).unwrap();
        let mut block = Block::new(2).unwrap();
        block.set_block_number(6);
        block.append_tx(swap);
        block.seal(1_700_000_006).unwrap();

        let segmented = block.get_segmented_block(&eth_range).unwrap();
        match &segmented.items[..] {
            [SegmentedBlockItem::Inclusion(item)] => {
                assert_eq!(item.state_index, 0);
                assert_eq!(item.output().segment, eth_range);
            }
            other => panic!("unexpected items {:?}", other),
        }

        let manager = history_manager(Arc::new(MockChainClient::new()));
        for deposit in &deposits {
            manager.append_deposit(deposit).await.unwrap();
        }
        manager.append_block_header(&header(&block)).await.unwrap();
        manager.init(KEY, eth_range);
        manager.append_segmented_block(KEY, &segmented).await.unwrap();

        let report = manager.verify_history(KEY).await.unwrap();
        assert_eq!(report.verified_blocks, vec![6]);
        let owned: Vec<_> = report.leaves_in(&eth_range).collect();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].owner(), Some(carol.address()));
        assert_eq!(owned[0].blk_num, 6);
    }

    #[tokio::test]
    async fn test_concurrent_keys() {
        let s = scenario();
        let manager = Arc::new(prepared(&s, Arc::new(MockChainClient::new()), &[6, 8, 10]).await);
        manager.init("segment2", s.segment2);
        for block in &s.blocks {
            manager
                .append_segmented_block("segment2", &block.get_segmented_block(&s.segment2).unwrap())
                .await
                .unwrap();
        }

        let (a, b, c) = tokio::join!(
            manager.verify_history(KEY),
            manager.verify_history("segment2"),
            manager.verify_history(KEY),
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert_eq!(a, c);
        let seg2: Vec<_> = b.leaves_in(&s.segment2).collect();
        assert_eq!(seg2.len(), 1);
        assert_eq!(seg2[0].blk_num, 10);
        assert_eq!(seg2[0].owner(), Some(bob().address()));
    }
}
