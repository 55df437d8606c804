//! In-memory doubles shared by the rule tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    Block, Blockstamp, CertificationRecord, Hash, IdentityRecord, LedgerReader, MembershipRecord,
    MonetaryState, PublicKey, Signature, SignatureVerifier, SourceId, SourceRecord, StorageError,
    TransactionRecord,
};
use std::collections::HashMap;

/// Verifier accepting every signature.
pub struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _signature: &Signature, _message: &[u8], _key: &PublicKey) -> bool {
        true
    }
}

#[derive(Default)]
struct State {
    blocks: Vec<Block>,
    transactions: HashMap<Hash, TransactionRecord>,
    sources: HashMap<SourceId, SourceRecord>,
    identities: HashMap<PublicKey, IdentityRecord>,
    certifications: Vec<CertificationRecord>,
    monetary: MonetaryState,
}

/// Reader over hand-filled state. Blocks are indexed by position.
#[derive(Default)]
pub struct MemoryReader {
    state: RwLock<State>,
}

impl MemoryReader {
    pub fn push_block(&self, block: Block) {
        self.state.write().blocks.push(block);
    }

    pub fn put_transaction(&self, record: TransactionRecord) {
        self.state
            .write()
            .transactions
            .insert(record.tx.hash(), record);
    }

    pub fn put_source(&self, source: SourceRecord) {
        self.state.write().sources.insert(source.id, source);
    }

    pub fn put_identity(&self, identity: IdentityRecord) {
        self.state.write().identities.insert(identity.pubkey, identity);
    }

    pub fn put_certification(&self, cert: CertificationRecord) {
        self.state.write().certifications.push(cert);
    }

    pub fn set_monetary_state(&self, monetary: MonetaryState) {
        self.state.write().monetary = monetary;
    }
}

pub fn identity_record(pubkey: PublicKey, uid: &str, member: bool, revoked: bool) -> IdentityRecord {
    IdentityRecord {
        pubkey,
        uid: uid.to_string(),
        created_on: Blockstamp::default(),
        member,
        was_member: member,
        revoked,
    }
}

#[async_trait]
impl LedgerReader for MemoryReader {
    async fn current_block(&self) -> Result<Option<Block>, StorageError> {
        Ok(self.state.read().blocks.last().cloned())
    }

    async fn block_at(&self, number: u64) -> Result<Option<Block>, StorageError> {
        Ok(self.state.read().blocks.get(number as usize).cloned())
    }

    async fn block_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError> {
        Ok(self
            .state
            .read()
            .blocks
            .iter()
            .find(|block| block.hash() == *hash)
            .cloned())
    }

    async fn blocks_range(&self, count: u64, from: u64) -> Result<Vec<Block>, StorageError> {
        Ok(self
            .state
            .read()
            .blocks
            .iter()
            .skip(from as usize)
            .take(count as usize)
            .cloned()
            .collect())
    }

    async fn transaction_by_hash(
        &self,
        hash: &Hash,
    ) -> Result<Option<TransactionRecord>, StorageError> {
        Ok(self.state.read().transactions.get(hash).cloned())
    }

    async fn source(&self, id: &SourceId) -> Result<Option<SourceRecord>, StorageError> {
        Ok(self.state.read().sources.get(id).cloned())
    }

    async fn identity(&self, pubkey: &PublicKey) -> Result<Option<IdentityRecord>, StorageError> {
        Ok(self.state.read().identities.get(pubkey).cloned())
    }

    async fn identity_by_uid(&self, uid: &str) -> Result<Option<IdentityRecord>, StorageError> {
        Ok(self
            .state
            .read()
            .identities
            .values()
            .find(|identity| identity.uid == uid)
            .cloned())
    }

    async fn membership(
        &self,
        _pubkey: &PublicKey,
    ) -> Result<Option<MembershipRecord>, StorageError> {
        Ok(None)
    }

    async fn members(&self) -> Result<Vec<PublicKey>, StorageError> {
        let mut members: Vec<PublicKey> = self
            .state
            .read()
            .identities
            .values()
            .filter(|identity| identity.member)
            .map(|identity| identity.pubkey)
            .collect();
        members.sort();
        Ok(members)
    }

    async fn certifications_to(
        &self,
        receiver: &PublicKey,
    ) -> Result<Vec<CertificationRecord>, StorageError> {
        Ok(self
            .state
            .read()
            .certifications
            .iter()
            .filter(|cert| cert.receiver == *receiver)
            .cloned()
            .collect())
    }

    async fn monetary_state(&self) -> Result<MonetaryState, StorageError> {
        Ok(self.state.read().monetary.clone())
    }
}
