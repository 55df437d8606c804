//! # Commit Properties
//!
//! - Idempotence: concurrent submissions of one hash share one outcome and
//!   one write
//! - Ordering: a later submission never resolves before an earlier one is
//!   committed, however slow the earlier one is
//! - Capacity: the pool refuses the (N+1)-th valid transaction

#[cfg(test)]
mod tests {
    use lc_04_documents::testing::{ChainBuilder, TestNode};
    use lc_04_documents::{
        CommitKey, DocumentConfig, DocumentDependencies, DocumentServices, InMemoryLedger,
        LedgerStore, TransactionSandbox,
    };
    use shared_bus::{EventFilter, InMemoryEventBus, LedgerEvent};
    use shared_crypto::Ed25519Verifier;
    use shared_types::{LedgerError, LedgerReader, PublicKey, Signature, SignatureVerifier};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_resubmissions_write_once() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let tx = node.pay(0, 1, 25, &anchor);
        let mut events = node.bus.subscribe(EventFilter::all());

        let submit = || node.services.transactions.submit(tx.clone());
        let (a, b, c) = tokio::join!(submit(), submit(), submit());

        assert_eq!(a, Ok(tx.clone()));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(node.ledger.pending_transactions().await.unwrap(), vec![tx]);
        assert_eq!(node.sandbox.len(), 1);

        assert!(matches!(events.recv().await, Some(LedgerEvent::TransactionAccepted(_))));
        assert!(events.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_rejections_are_identical() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let mut tx = node.pay(0, 1, 25, &anchor);
        tx.outputs[0].amount += 1;

        let (a, b) = tokio::join!(
            node.services.transactions.submit(tx.clone()),
            node.services.transactions.submit(tx.clone()),
        );
        assert_eq!(a, b);
        assert_eq!(
            a.unwrap_err().rule_message(),
            Some("Transaction inputs sum must equal outputs sum")
        );
    }

    /// Verifier taking its time on one message.
    struct SlowOn {
        message: Vec<u8>,
        delay: Duration,
    }

    impl SignatureVerifier for SlowOn {
        fn verify(&self, signature: &Signature, message: &[u8], key: &PublicKey) -> bool {
            if message == self.message.as_slice() {
                std::thread::sleep(self.delay);
            }
            Ed25519Verifier.verify(signature, message, key)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fast_submission_waits_for_slow_one() {
        // Build the funded chain on a regular node, then replay it on a node
        // whose verifier is slow for one transaction.
        let source = TestNode::new(10);
        let anchor = source.funded().await;
        let chain = ChainBuilder::new(2);
        let slow_tx = source.pay(0, 1, 10, &anchor);
        let fast_tx = source.pay(1, 0, 10, &anchor);

        let ledger = Arc::new(InMemoryLedger::new("slow"));
        let bus = Arc::new(InMemoryEventBus::new());
        let deps = DocumentDependencies {
            store: Arc::clone(&ledger),
            admission: Arc::new(TransactionSandbox::new(10)),
            verifier: Arc::new(SlowOn {
                message: slow_tx.unsigned_raw().into_bytes(),
                delay: Duration::from_millis(150),
            }),
            publisher: Arc::clone(&bus),
        };
        let config = DocumentConfig {
            params: chain.params().clone(),
            node_pubkey: [0xEE; 32],
        };
        let services = Arc::new(DocumentServices::new(deps, config, tracing::Span::none()));
        for number in 0..=anchor.number {
            let block = source.ledger.block_at(number).await.unwrap().unwrap();
            services.blocks.submit(block).await.unwrap();
        }

        let slow = {
            let services = Arc::clone(&services);
            let tx = slow_tx.clone();
            tokio::spawn(async move { services.transactions.submit(tx).await })
        };
        while services.pipeline.in_flight() != Some(CommitKey::Transaction(slow_tx.hash())) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        services.transactions.submit(fast_tx.clone()).await.unwrap();
        // The slow transaction was committed before the fast one resolved.
        assert_eq!(
            ledger.pending_transactions().await.unwrap(),
            vec![slow_tx.clone(), fast_tx]
        );
        assert_eq!(slow.await.unwrap(), Ok(slow_tx));
    }

    #[tokio::test]
    async fn test_capacity_boundary() {
        const CAPACITY: usize = 3;
        let node = TestNode::new(CAPACITY);
        let anchor = node.funded().await;

        for amount in 1..=CAPACITY as u64 {
            node.services
                .transactions
                .submit(node.pay(0, 1, amount * 10, &anchor))
                .await
                .unwrap();
        }
        let extra = node.pay(0, 1, 99, &anchor);
        let err = node
            .services
            .transactions
            .submit(extra.clone())
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::CapacityExceeded);
        assert_eq!(node.sandbox.len(), CAPACITY);

        // The same transaction passes every rule on a node with room for it.
        let roomy = TestNode::new(CAPACITY + 1);
        roomy.funded().await;
        assert_eq!(roomy.services.transactions.submit(extra.clone()).await, Ok(extra));
    }
}
