//! Chain fixtures for tests.
//!
//! [`ChainBuilder`] produces correctly signed blocks that pass every rule
//! with the [`test_params`] parameters: a root block founding the web of
//! trust, then empty or transaction-carrying blocks on top of whatever the
//! given reader holds as head. [`TestNode`] wires both services over the
//! in-memory adapters.

use crate::adapters::{InMemoryLedger, TransactionSandbox};
use crate::service::{DocumentConfig, DocumentDependencies, DocumentServices};
use lc_01_rules::{dividend_due, expected_dividend, expected_median_time};
use shared_bus::InMemoryEventBus;
use shared_crypto::{
    seal_block, sign_certification, sign_identity, sign_membership, sign_transaction,
    Ed25519KeyPair, Ed25519Verifier,
};
use shared_types::{
    amount_in_base_units, to_hex, Block, Blockstamp, Certification, ConsensusParams, Identity,
    LedgerReader, Membership, MembershipKind, PublicKey, SourceRecord, StorageError, Transaction,
    TxInput, TxOutput, TxUnlock, UnlockProof, TRANSACTION_VERSION,
};
use std::sync::Arc;

pub const TEST_CURRENCY: &str = "test-net";

/// Time of the root block.
pub const ROOT_TIME: u64 = 1_000;

/// Parameters keeping fixtures cheap: no proof of work, one certification
/// per newcomer and a dividend every ten seconds.
pub fn test_params() -> ConsensusParams {
    ConsensusParams {
        c: 0.1,
        dt: 10,
        ud0: 100,
        sig_qty: 1,
        pow_min: 0,
        avg_gen_time: 60,
        median_time_blocks: 3,
        ..ConsensusParams::default()
    }
}

/// Unsigned transaction with no content.
pub fn empty_transaction() -> Transaction {
    Transaction {
        version: TRANSACTION_VERSION,
        currency: TEST_CURRENCY.into(),
        blockstamp: Blockstamp::default(),
        locktime: 0,
        issuers: Vec::new(),
        inputs: Vec::new(),
        unlocks: Vec::new(),
        outputs: Vec::new(),
        comment: String::new(),
        signatures: Vec::new(),
    }
}

/// Builds blocks issued by the first of a fixed set of founders.
pub struct ChainBuilder {
    params: ConsensusParams,
    founders: Vec<Ed25519KeyPair>,
}

impl ChainBuilder {
    /// `founders` key pairs derived from fixed seeds. At least two are
    /// needed to close the root certification ring.
    pub fn new(founders: usize) -> Self {
        Self::with_params(founders, test_params())
    }

    pub fn with_params(founders: usize, params: ConsensusParams) -> Self {
        assert!(founders >= 2, "a root block needs at least two founders");
        let founders = (1..=founders)
            .map(|i| Ed25519KeyPair::from_seed([i as u8; 32]))
            .collect();
        Self { params, founders }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn founder(&self, index: usize) -> &Ed25519KeyPair {
        &self.founders[index]
    }

    pub fn founder_pubkeys(&self) -> Vec<PublicKey> {
        self.founders.iter().map(Ed25519KeyPair::public_key).collect()
    }

    /// Root block: every founder declares an identity, joins, and certifies
    /// the next founder in a ring.
    pub fn root(&self) -> Block {
        let mut block = Block {
            currency: TEST_CURRENCY.into(),
            pow_min: self.params.pow_min,
            time: ROOT_TIME,
            median_time: ROOT_TIME,
            members_count: self.founders.len() as u64,
            unit_base: Some(0),
            parameters: Some(self.params.clone()),
            ..Block::default()
        };

        for (i, founder) in self.founders.iter().enumerate() {
            let uid = format!("founder{}", i);
            let mut identity = Identity {
                issuer: founder.public_key(),
                uid: uid.clone(),
                created_on: Blockstamp::default(),
                signature: [0; 64],
            };
            sign_identity(founder, &mut identity, TEST_CURRENCY);
            block.identities.push(identity);

            let mut joiner = Membership {
                issuer: founder.public_key(),
                kind: MembershipKind::In,
                uid,
                created_on: Blockstamp::default(),
                identity_created_on: Blockstamp::default(),
                signature: [0; 64],
            };
            sign_membership(founder, &mut joiner, TEST_CURRENCY);
            block.joiners.push(joiner);

            let receiver = &self.founders[(i + 1) % self.founders.len()];
            let mut cert = Certification {
                issuer: founder.public_key(),
                receiver: receiver.public_key(),
                block_number: 0,
                signature: [0; 64],
            };
            sign_certification(founder, &mut cert, TEST_CURRENCY);
            block.certifications.push(cert);
        }

        seal_block(&self.founders[0], &mut block);
        block
    }

    /// Block following the reader's head, `time_step` seconds after it,
    /// carrying `transactions` and the dividend when one is due.
    pub async fn next_block(
        &self,
        reader: &dyn LedgerReader,
        transactions: Vec<Transaction>,
        time_step: u64,
    ) -> Result<Block, StorageError> {
        let head = reader
            .current_block()
            .await?
            .ok_or_else(|| StorageError::NotFound("chain head".into()))?;
        let number = head.number + 1;
        let median_time = expected_median_time(number, &self.params, &head, reader).await?;

        let state = reader.monetary_state().await?;
        let (dividend, unit_base) = if dividend_due(&state, median_time) {
            let due = expected_dividend(&self.params, &state);
            (Some(due.amount), Some(due.base))
        } else {
            (None, head.unit_base)
        };
        let created = dividend
            .and_then(|amount| amount_in_base_units(amount, unit_base.unwrap_or(0)))
            .map_or(0, |value| value as u64 * head.members_count);

        let mut block = Block {
            currency: TEST_CURRENCY.into(),
            number,
            pow_min: self.params.pow_min,
            time: head.time.max(median_time) + time_step,
            median_time,
            members_count: head.members_count,
            monetary_mass: head.monetary_mass + created,
            dividend,
            unit_base,
            previous_hash: Some(head.hash()),
            previous_issuer: Some(head.issuer),
            transactions,
            ..Block::default()
        };
        seal_block(&self.founders[0], &mut block);
        Ok(block)
    }

    /// Signed transfer of `amount` from founder `from` to `to`, spending
    /// `source` and returning the rest to the founder.
    pub fn transfer(
        &self,
        from: usize,
        source: &SourceRecord,
        to: &PublicKey,
        amount: u64,
        anchor: &Block,
    ) -> Transaction {
        let founder = &self.founders[from];
        let mut outputs = vec![TxOutput {
            amount,
            base: source.base,
            conditions: format!("SIG({})", to_hex(to)),
        }];
        if source.amount > amount {
            outputs.push(TxOutput {
                amount: source.amount - amount,
                base: source.base,
                conditions: format!("SIG({})", to_hex(&founder.public_key())),
            });
        }

        let mut tx = Transaction {
            blockstamp: anchor.blockstamp(),
            inputs: vec![TxInput {
                amount: source.amount,
                base: source.base,
                source: source.id,
            }],
            unlocks: vec![TxUnlock {
                input_index: 0,
                proofs: vec![UnlockProof::Sig(0)],
            }],
            outputs,
            ..empty_transaction()
        };
        sign_transaction(&[founder], &mut tx);
        tx
    }
}

pub type TestServices =
    DocumentServices<InMemoryLedger, TransactionSandbox, Ed25519Verifier, InMemoryEventBus>;

/// Document services over fresh in-memory adapters, with a two-founder
/// chain builder. Must be created inside a tokio runtime.
pub struct TestNode {
    pub chain: ChainBuilder,
    pub ledger: Arc<InMemoryLedger>,
    pub sandbox: Arc<TransactionSandbox>,
    pub bus: Arc<InMemoryEventBus>,
    pub services: TestServices,
}

impl TestNode {
    pub fn new(capacity: usize) -> Self {
        Self::with_node(capacity, [0xEE; 32])
    }

    /// Node whose own transactions are identified by `node_pubkey`.
    pub fn with_node(capacity: usize, node_pubkey: PublicKey) -> Self {
        let chain = ChainBuilder::new(2);
        let ledger = Arc::new(InMemoryLedger::new("test"));
        let sandbox = Arc::new(TransactionSandbox::new(capacity));
        let bus = Arc::new(InMemoryEventBus::new());
        let deps = DocumentDependencies {
            store: Arc::clone(&ledger),
            admission: Arc::clone(&sandbox),
            verifier: Arc::new(Ed25519Verifier),
            publisher: Arc::clone(&bus),
        };
        let config = DocumentConfig {
            params: chain.params().clone(),
            node_pubkey,
        };
        let services = DocumentServices::new(deps, config, tracing::info_span!("documents"));
        Self {
            chain,
            ledger,
            sandbox,
            bus,
            services,
        }
    }

    /// Next block over the current head, twenty seconds later.
    pub async fn next_block(&self, transactions: Vec<Transaction>) -> Block {
        self.chain
            .next_block(self.ledger.as_ref(), transactions, 20)
            .await
            .expect("in-memory ledger never fails reads")
    }

    /// Commit the root, an empty block, then the block paying the first
    /// dividend, which is returned.
    pub async fn funded(&self) -> Block {
        let blocks = &self.services.blocks;
        blocks.submit(self.chain.root()).await.expect("root accepted");
        let first = self.next_block(Vec::new()).await;
        blocks.submit(first).await.expect("first block accepted");
        let paying = self.next_block(Vec::new()).await;
        assert!(paying.dividend.is_some(), "second block pays a dividend");
        blocks.submit(paying.clone()).await.expect("dividend block accepted");
        paying
    }

    /// Oldest unspent source of founder `index`.
    pub fn dividend_of(&self, index: usize) -> SourceRecord {
        let pubkey = self.chain.founder(index).public_key();
        self.ledger
            .sources_of(&pubkey)
            .into_iter()
            .next()
            .expect("founder holds a source")
    }

    /// Transfer from founder `from` to founder `to`, spending the oldest
    /// source of `from`.
    pub fn pay(&self, from: usize, to: usize, amount: u64, anchor: &Block) -> Transaction {
        let to = self.chain.founder(to).public_key();
        self.chain
            .transfer(from, &self.dividend_of(from), &to, amount, anchor)
    }
}
