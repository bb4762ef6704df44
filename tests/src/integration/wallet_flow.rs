//! # Wallet Flow
//!
//! Two wallets watch the same chain. Alice deposits, pays Bob part of her
//! deposit, and Bob exits what he received.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use pc_02_sum_merkle::Block;
    use pc_03_segment_history::{
        MockChainClient, WalletConfig, WalletEvent, WalletNotification, WalletTracker,
    };
    use shared_types::Address;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn deposit(depositor: Address, start: u64, end: u64, blk_num: u64) -> WalletEvent {
        WalletEvent::Deposited {
            depositor,
            token_id: 0,
            start,
            end,
            blk_num,
        }
    }

    fn block_events(block: &Block) -> Vec<WalletEvent> {
        vec![
            WalletEvent::BlockHeaderAdded {
                blk_num: block.number(),
                root: block.get_root().unwrap(),
            },
            WalletEvent::BlockReceived(block.clone()),
        ]
    }

    #[tokio::test]
    async fn test_deposit_pay_exit() {
        let (alice, bob) = (alice(), bob());
        let client = Arc::new(MockChainClient::new());
        let history = Arc::new(history_manager(client.clone()));
        let mut alice_wallet = WalletTracker::new(
            WalletConfig::for_testing(alice.address()),
            predicates(),
            history.clone(),
        );
        let mut bob_wallet = WalletTracker::new(
            WalletConfig::for_testing(bob.address()),
            predicates(),
            history.clone(),
        );
        assert_eq!(WalletConfig::for_testing([0; 20]).ownership_predicate, OWNERSHIP);

        let payment = transfer(&alice, eth(0, 400_000), 3, bob.address());
        let block = sealed_block(3, vec![payment.clone()]);
        client.insert_block(block.clone());

        let mut events = vec![
            deposit(alice.address(), 0, 1_000_000, 1),
            deposit(alice.address(), 1_000_000, 2_000_000, 2),
        ];
        events.extend(block_events(&block));

        // Alice consumes the feed through her event loop
        let (event_tx, event_rx) = mpsc::channel(16);
        let (note_tx, mut note_rx) = mpsc::channel(16);
        for event in events.clone() {
            event_tx.send(event).await.unwrap();
        }
        drop(event_tx);
        let alice_task = tokio::spawn(async move {
            let applied = alice_wallet.run(event_rx, note_tx).await;
            (alice_wallet, applied)
        });
        let (alice_wallet, applied) = alice_task.await.unwrap();
        assert_eq!(applied, 4);

        let mut alice_notes = Vec::new();
        while let Some(note) = note_rx.recv().await {
            alice_notes.push(note);
        }
        assert_eq!(alice_notes.len(), 3);
        assert!(alice_notes.contains(&WalletNotification::Sent {
            tx_hash: payment.tx_hash(),
            segment: eth(0, 400_000),
        }));
        assert_eq!(alice_wallet.state().balance(0), 1_600_000);
        assert_eq!(alice_wallet.loaded_block(), 3);

        // Bob applies the same feed directly; headers are already stored
        let mut received = Vec::new();
        for event in events {
            received.extend(bob_wallet.apply(event).await.unwrap());
        }
        assert!(received.contains(&WalletNotification::Received {
            tx_hash: payment.tx_hash(),
            segment: eth(0, 400_000),
        }));
        assert_eq!(bob_wallet.state().balance(0), 400_000);
        assert_eq!(client.fetch_count(), 1);

        let exit = bob_wallet
            .apply(WalletEvent::ExitStarted {
                exit_id: 7,
                exitable_at: 1_700_086_400,
                segment: eth(0, 400_000),
            })
            .await
            .unwrap();
        assert_eq!(exit.len(), 1);
        assert_eq!(bob_wallet.state().balance(0), 0);
        assert_eq!(bob_wallet.exits()[0].id, 7);
        assert_eq!(
            bob_wallet.exits()[0].state_bytes,
            payment.state_updates[0].encode()
        );

        bob_wallet
            .apply(WalletEvent::ExitFinalized {
                token_id: 0,
                start: 0,
                end: 400_000,
            })
            .await
            .unwrap();
        let ranges = bob_wallet.exitable_ranges();
        assert!(ranges.exitable_end(&eth(0, 400_000)).is_err());
        assert_eq!(ranges.exitable_end(&eth(400_000, 500_000)), Ok(2_000_000));
    }

    #[tokio::test]
    async fn test_unverifiable_receipt_kept_unverified() {
        let (alice, bob) = (alice(), bob());
        // nothing on chain: the history walk cannot fetch block 3
        let client = Arc::new(MockChainClient::new());
        let history = Arc::new(history_manager(client.clone()));
        let mut bob_wallet = WalletTracker::new(
            WalletConfig::for_testing(bob.address()),
            predicates(),
            history.clone(),
        );

        let block = sealed_block(3, vec![transfer(&alice, eth(0, 400_000), 3, bob.address())]);
        bob_wallet.apply(deposit(alice.address(), 0, 1_000_000, 1)).await.unwrap();
        for event in block_events(&block) {
            bob_wallet.apply(event).await.unwrap();
        }

        // the walk left block 3 unverified, so the output is held but not marked verified
        assert_eq!(client.fetch_count(), 2);
        assert_eq!(bob_wallet.state().balance(0), 400_000);
        assert!(!bob_wallet.state().utxos()[0].verified);
    }

    #[tokio::test]
    async fn test_receipt_already_spent_is_rejected() {
        let (alice, bob) = (alice(), bob());
        let carol: Address = [0x33; 20];
        let client = Arc::new(MockChainClient::new());
        let history = Arc::new(history_manager(client.clone()));
        let mut bob_wallet = WalletTracker::new(
            WalletConfig::for_testing(bob.address()),
            predicates(),
            history.clone(),
        );

        let to_bob = sealed_block(3, vec![transfer(&alice, eth(0, 400_000), 3, bob.address())]);
        let to_carol = sealed_block(4, vec![transfer(&bob, eth(0, 400_000), 4, carol)]);
        client.insert_block(to_bob.clone());
        client.insert_block(to_carol.clone());

        // block 4 is already known when the wallet catches up on block 3
        bob_wallet.apply(deposit(alice.address(), 0, 1_000_000, 1)).await.unwrap();
        for block in [&to_bob, &to_carol] {
            let added = block_events(block).remove(0);
            bob_wallet.apply(added).await.unwrap();
        }
        let notes = bob_wallet
            .apply(WalletEvent::BlockReceived(to_bob))
            .await
            .unwrap();

        // the history ends with Carol, so nothing is received
        assert!(notes.is_empty());
        assert_eq!(bob_wallet.state().balance(0), 0);
        assert_eq!(bob_wallet.loaded_block(), 3);
        assert_eq!(client.fetch_count(), 2);
    }
}
