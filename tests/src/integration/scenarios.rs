//! # Rejection Scenarios
//!
//! Documents that must be refused with a stable reason, checked both at the
//! rule level and through the services.

#[cfg(test)]
mod tests {
    use lc_01_rules::{local_rule, RuleContext, RuleEngine};
    use lc_04_documents::testing::{test_params, ChainBuilder, TestNode};
    use shared_bus::{EventFilter, LedgerEvent};
    use shared_crypto::{seal_block, Ed25519Verifier};
    use shared_types::{ErrorKind, LedgerError, LedgerReader};

    #[test]
    fn test_parameters_rule_alone_refuses_bare_root() {
        let chain = ChainBuilder::new(2);
        let mut root = chain.root();
        root.parameters = None;
        let params = test_params();
        let ctx = RuleContext {
            params: &params,
            verifier: &Ed25519Verifier,
        };

        let rules = [local_rule("check_parameters").unwrap()];
        let violation = RuleEngine::check_local(&rules, &root, &ctx).unwrap_err();
        assert_eq!(violation.rule, "check_parameters");
        assert_eq!(violation.message, "Parameters must be provided for root block");
    }

    #[tokio::test]
    async fn test_root_without_parameters() {
        let node = TestNode::new(10);
        let mut root = node.chain.root();
        root.parameters = None;
        seal_block(node.chain.founder(0), &mut root);
        let mut events = node.bus.subscribe(EventFilter::all());

        let err = node.services.blocks.submit(root.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(
            err.rule_message(),
            Some("Parameters must be provided for root block")
        );
        assert_eq!(node.ledger.current_block().await.unwrap(), None);
        match events.recv().await {
            Some(LedgerEvent::BlockRejected { blockstamp, .. }) => {
                assert_eq!(blockstamp, root.blockstamp());
            }
            other => panic!("unexpected event {:?}", other),
        }

        // A correct root is still welcome afterwards.
        node.services.blocks.submit(node.chain.root()).await.unwrap();
        assert_eq!(node.ledger.height(), 1);
    }

    #[tokio::test]
    async fn test_block_missing_previous_hash() {
        let node = TestNode::new(10);
        node.services.blocks.submit(node.chain.root()).await.unwrap();
        let valid = node.next_block(Vec::new()).await;
        let mut block = valid.clone();
        block.previous_hash = None;
        seal_block(node.chain.founder(0), &mut block);

        let err = node.services.blocks.submit(block).await.unwrap_err();
        assert_eq!(
            err.rule_message(),
            Some("PreviousHash must be provided for non-root block")
        );
        assert_eq!(node.ledger.height(), 1);

        node.services.blocks.submit(valid).await.unwrap();
        assert_eq!(node.ledger.height(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_source_in_block() {
        let node = TestNode::new(10);
        let anchor = node.funded().await;
        let first = node.pay(0, 1, 15, &anchor);
        let second = node.pay(0, 1, 35, &anchor);

        let block = node.next_block(vec![first.clone(), second.clone()]).await;
        let err = node.services.blocks.submit(block).await.unwrap_err();
        assert_eq!(
            err.rule_message(),
            Some("It cannot exist 2 identical sources for transactions inside a given block")
        );
        assert_eq!(node.ledger.current_block().await.unwrap(), Some(anchor.clone()));

        // Each transaction is valid on its own.
        let alone = node.next_block(vec![first.clone()]).await;
        node.services.blocks.submit(alone).await.unwrap();
        let record = node
            .ledger
            .transaction_by_hash(&first.hash())
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_written());

        // The other one now spends a consumed source.
        let err = node.services.transactions.submit(second).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(err.rule_message(), Some("Source already consumed"));
    }
}
