//! # End-to-End Flows
//!
//! Block and transaction flows through the document services over the
//! in-memory adapters, with real Ed25519 signatures.

#[cfg(test)]
mod tests {
    use lc_04_documents::testing::TestNode;
    use lc_04_documents::{LedgerStore, PendingTransactions, RemoteContacter};
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_types::{LedgerReader, SourceId};

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let alice = node.chain.founder(0).public_key();
        let bob = node.chain.founder(1).public_key();

        // Alice pays Bob 30 out of her first dividend.
        let payment = node.pay(0, 1, 30, &anchor);
        node.services.transactions.submit(payment.clone()).await.unwrap();
        let block = node.next_block(vec![payment.clone()]).await;
        let written = node.services.blocks.submit(block).await.unwrap();
        assert_eq!(written.number, 3);
        assert!(node.sandbox.is_empty());

        let received = SourceId::Utxo {
            tx_hash: payment.hash(),
            output_index: 0,
        };
        let change = SourceId::Utxo {
            tx_hash: payment.hash(),
            output_index: 1,
        };
        assert_eq!(node.ledger.source(&received).await.unwrap().unwrap().amount, 30);
        assert_eq!(node.ledger.source(&change).await.unwrap().unwrap().amount, 70);

        // Bob sends the received coins back, in full.
        let record = node.ledger.source(&received).await.unwrap().unwrap();
        let head = node.ledger.current_block().await.unwrap().unwrap();
        let refund = node.chain.transfer(1, &record, &alice, 30, &head);
        assert_eq!(refund.outputs.len(), 1);
        node.services.transactions.submit(refund.clone()).await.unwrap();
        let block = node.next_block(vec![refund.clone()]).await;
        node.services.blocks.submit(block).await.unwrap();

        assert!(node.ledger.source(&received).await.unwrap().unwrap().consumed);
        let alice_amounts: Vec<u64> = node
            .ledger
            .sources_of(&alice)
            .iter()
            .map(|source| source.amount)
            .collect();
        assert!(alice_amounts.contains(&30));
        assert!(alice_amounts.contains(&70));
        assert!(node
            .ledger
            .sources_of(&bob)
            .iter()
            .all(|source| source.id != received));
    }

    #[tokio::test]
    async fn test_block_chains_transactions() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let bob = node.chain.founder(1).public_key();

        // The second transaction spends the change of the first one.
        let first = node.pay(0, 1, 30, &anchor);
        let change = SourceId::Utxo {
            tx_hash: first.hash(),
            output_index: 1,
        };
        let pending_change = shared_types::SourceRecord {
            id: change,
            amount: 70,
            base: 0,
            conditions: first.outputs[1].conditions.clone(),
            consumed: false,
            written_time: 0,
        };
        let second = node.chain.transfer(0, &pending_change, &bob, 20, &anchor);

        let block = node.next_block(vec![first.clone(), second.clone()]).await;
        node.services.blocks.submit(block).await.unwrap();

        assert!(node.ledger.source(&change).await.unwrap().unwrap().consumed);
        let bob_amounts: Vec<u64> = node
            .ledger
            .sources_of(&bob)
            .iter()
            .map(|source| source.amount)
            .collect();
        assert!(bob_amounts.contains(&30));
        assert!(bob_amounts.contains(&20));
        for tx in [&first, &second] {
            let record = node.ledger.transaction_by_hash(&tx.hash()).await.unwrap();
            assert!(record.unwrap().is_written());
        }
    }

    #[tokio::test]
    async fn test_second_node_syncs_from_first() {
        let origin = TestNode::new(10);
        let anchor = origin.funded().await;
        let payment = origin.pay(0, 1, 45, &anchor);
        let block = origin.next_block(vec![payment.clone()]).await;
        origin.services.blocks.submit(block).await.unwrap();

        let remote: &dyn RemoteContacter = origin.ledger.as_ref();
        let head = remote.get_current().await.unwrap().unwrap();
        let blocks = remote.get_blocks(head.number + 1, 0).await.unwrap();
        assert_eq!(blocks.len() as u64, head.number + 1);

        let replica = TestNode::new(10);
        for block in blocks {
            replica.services.blocks.submit(block).await.unwrap();
        }
        assert_eq!(replica.ledger.current_block().await.unwrap(), Some(head));
        assert_eq!(
            replica.ledger.monetary_state().await.unwrap(),
            origin.ledger.monetary_state().await.unwrap()
        );
        let bob = origin.chain.founder(1).public_key();
        assert_eq!(replica.ledger.sources_of(&bob), origin.ledger.sources_of(&bob));

        // The replica refuses what it already holds.
        let again = remote.get_block(0).await.unwrap().unwrap();
        assert!(replica.services.blocks.submit(again).await.is_err());
    }

    #[tokio::test]
    async fn test_events_follow_commit_order() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let mut events = node.bus.subscribe(EventFilter::all());
        let mut blocks_only = node.bus.subscribe(EventFilter::topics(vec![EventTopic::Blocks]));

        let a = node.pay(0, 1, 10, &anchor);
        let b = node.pay(1, 0, 10, &anchor);
        let (ra, rb) = tokio::join!(
            node.services.transactions.submit(a.clone()),
            node.services.transactions.submit(b.clone()),
        );
        ra.unwrap();
        rb.unwrap();
        let pending = node.ledger.pending_transactions().await.unwrap();
        let block = node.next_block(pending.clone()).await;
        let stamp = node.services.blocks.submit(block).await.unwrap();

        for expected in &pending {
            match events.recv().await {
                Some(LedgerEvent::TransactionAccepted(tx)) => assert_eq!(&tx, expected),
                other => panic!("unexpected event {:?}", other),
            }
        }
        match events.recv().await {
            Some(LedgerEvent::BlockAccepted {
                blockstamp,
                transactions,
                ..
            }) => {
                assert_eq!(blockstamp, stamp);
                let hashes: Vec<_> = pending.iter().map(|tx| tx.hash()).collect();
                assert_eq!(transactions, hashes);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            blocks_only.recv().await,
            Some(LedgerEvent::BlockAccepted { .. })
        ));
    }

    #[tokio::test]
    async fn test_pending_feed_batches_admissions() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let mut feed = PendingTransactions::new(&node.bus);

        let a = node.pay(0, 1, 10, &anchor);
        let b = node.pay(1, 0, 10, &anchor);
        node.services.transactions.submit(a.clone()).await.unwrap();
        node.services.transactions.submit(b.clone()).await.unwrap();

        let mut seen = Vec::new();
        while seen.len() < 2 {
            seen.extend(feed.next_batch().await.unwrap());
        }
        assert_eq!(seen, vec![a, b]);
    }
}
