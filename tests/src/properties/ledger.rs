//! # Ledger Properties
//!
//! - Balance: an accepted transaction creates exactly what it consumes,
//!   counted in base units
//! - Uniqueness: an accepted block names a pubkey at most once across
//!   joiners, actives, leavers and excluded

#[cfg(test)]
mod tests {
    use lc_01_rules::{RuleContext, RuleEngine};
    use lc_04_documents::testing::{empty_transaction, test_params, ChainBuilder, TestNode};
    use proptest::prelude::*;
    use shared_crypto::{seal_block, sign_membership, sign_transaction, Ed25519Verifier};
    use shared_types::{
        amount_in_base_units, to_hex, Block, Blockstamp, LedgerReader, Membership,
        MembershipKind, PublicKey, SourceId, Transaction, TxInput, TxOutput, TxUnlock,
        UnlockProof,
    };
    use std::collections::HashSet;

    const UNBALANCED: &str = "Transaction inputs sum must equal outputs sum";

    fn spend(
        chain: &ChainBuilder,
        source: SourceId,
        input: (u64, u32),
        outputs: &[(u64, u32)],
    ) -> Transaction {
        let receiver = to_hex(&chain.founder(1).public_key());
        let mut tx = Transaction {
            inputs: vec![TxInput {
                amount: input.0,
                base: input.1,
                source,
            }],
            unlocks: vec![TxUnlock {
                input_index: 0,
                proofs: vec![UnlockProof::Sig(0)],
            }],
            outputs: outputs
                .iter()
                .map(|&(amount, base)| TxOutput {
                    amount,
                    base,
                    conditions: format!("SIG({})", receiver),
                })
                .collect(),
            ..empty_transaction()
        };
        sign_transaction(&[chain.founder(0)], &mut tx);
        tx
    }

    fn base_units(items: &[(u64, u32)]) -> i128 {
        items
            .iter()
            .map(|&(amount, base)| amount_in_base_units(amount, base).unwrap())
            .sum()
    }

    proptest! {
        #[test]
        fn prop_local_check_accepts_exactly_balanced_amounts(
            input in 1u64..10_000,
            outputs in prop::collection::vec((1u64..5_000, 0u32..=1), 1..4),
        ) {
            let chain = ChainBuilder::new(2);
            let params = test_params();
            let ctx = RuleContext { params: &params, verifier: &Ed25519Verifier };
            let source = SourceId::Dividend { issuer: chain.founder(0).public_key(), block_number: 2 };
            let tx = spend(&chain, source, (input, 0), &outputs);

            let balanced = base_units(&outputs) == i128::from(input);
            match RuleEngine::check_local_transaction(&tx, &ctx) {
                Ok(()) => prop_assert!(balanced),
                Err(violation) => {
                    prop_assert!(!balanced);
                    prop_assert_eq!(violation.message.as_str(), UNBALANCED);
                }
            }
        }
    }

    fn outputs_strategy() -> impl Strategy<Value = Vec<u64>> {
        prop_oneof![
            (1u64..100).prop_map(|first| vec![first, 100 - first]),
            Just(vec![100]),
            prop::collection::vec(1u64..80, 1..4),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_accepted_transactions_conserve_amounts(amounts in outputs_strategy()) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let node = TestNode::new(10);
                node.funded().await;
                let source = node.dividend_of(0);
                let outputs: Vec<(u64, u32)> = amounts.iter().map(|&a| (a, 0)).collect();
                let tx = spend(&node.chain, source.id, (source.amount, source.base), &outputs);

                match node.services.transactions.submit(tx).await {
                    Ok(accepted) => {
                        let inputs: Vec<(u64, u32)> =
                            accepted.inputs.iter().map(|i| (i.amount, i.base)).collect();
                        let outputs: Vec<(u64, u32)> =
                            accepted.outputs.iter().map(|o| (o.amount, o.base)).collect();
                        prop_assert_eq!(base_units(&inputs), base_units(&outputs));
                    }
                    Err(err) => {
                        prop_assert_ne!(amounts.iter().sum::<u64>(), 100);
                        prop_assert_eq!(err.rule_message(), Some(UNBALANCED));
                    }
                }
                Ok(())
            })?;
        }
    }

    fn renewal(chain: &ChainBuilder, founder: usize, head: &Block) -> Membership {
        let mut membership = Membership {
            issuer: chain.founder(founder).public_key(),
            kind: MembershipKind::In,
            uid: format!("founder{}", founder),
            created_on: head.blockstamp(),
            identity_created_on: Blockstamp::default(),
            signature: [0; 64],
        };
        sign_membership(chain.founder(founder), &mut membership, &head.currency);
        membership
    }

    fn assert_disjoint_memberships(block: &Block) {
        let mut seen: HashSet<PublicKey> = HashSet::new();
        let named = block
            .joiners
            .iter()
            .chain(&block.actives)
            .chain(&block.leavers)
            .map(|ms| ms.issuer)
            .chain(block.excluded.iter().copied());
        for pubkey in named {
            assert!(seen.insert(pubkey), "block {} repeats a pubkey", block.number);
        }
    }

    #[tokio::test]
    async fn test_block_renewing_and_excluding_one_member_is_rejected() {
        let node = TestNode::new(10);
        let head = node.funded().await;
        let mut block = node.next_block(Vec::new()).await;
        block.actives.push(renewal(&node.chain, 0, &head));
        block.excluded.push(node.chain.founder(0).public_key());
        seal_block(node.chain.founder(0), &mut block);

        let err = node.services.blocks.submit(block).await.unwrap_err();
        assert_eq!(
            err.rule_message(),
            Some("Block cannot contain a same pubkey more than once in joiners, actives, leavers and excluded")
        );
        assert_eq!(node.ledger.current_block().await.unwrap(), Some(head));
    }

    #[tokio::test]
    async fn test_block_renewing_and_leaving_one_member_is_rejected() {
        let node = TestNode::new(10);
        let head = node.funded().await;
        let mut block = node.next_block(Vec::new()).await;
        block.actives.push(renewal(&node.chain, 1, &head));
        let mut leave = renewal(&node.chain, 1, &head);
        leave.kind = MembershipKind::Out;
        sign_membership(node.chain.founder(1), &mut leave, &head.currency);
        block.leavers.push(leave);
        seal_block(node.chain.founder(0), &mut block);

        assert!(node.services.blocks.submit(block).await.is_err());
        assert_eq!(node.ledger.height(), head.number + 1);
    }

    #[tokio::test]
    async fn test_accepted_blocks_name_each_pubkey_once() {
        let node = TestNode::new(10);
        let head = node.funded().await;
        let mut block = node.next_block(Vec::new()).await;
        block.actives.push(renewal(&node.chain, 0, &head));
        seal_block(node.chain.founder(0), &mut block);
        node.services.blocks.submit(block).await.unwrap();

        for number in 0..node.ledger.height() {
            let block = node.ledger.block_at(number).await.unwrap().unwrap();
            assert_disjoint_memberships(&block);
        }
    }
}
