//! # In-Memory Ledger
//!
//! Complete `LedgerStore` kept in process memory. Backs tests and
//! single-node runs; also serves its own chain as a synchronization source.
//!
//! Blocks are applied copy-on-write: entries are applied to a clone of the
//! state, which replaces the live state only when every entry succeeded.

use crate::ports::{LedgerStore, PeerInfo, PendingRequirement, RemoteContacter};
use async_trait::async_trait;
use lc_02_indexer::{IndexEntry, IndexKind, IndexOp};
use parking_lot::RwLock;
use shared_types::{
    Block, CertificationRecord, DividendRecord, Hash, IdentityRecord, LedgerReader,
    MembershipEvent, MembershipRecord, MonetaryState, PublicKey, SourceId, SourceRecord,
    StorageError, Transaction, TransactionRecord,
};
use shared_types::{short, to_hex};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default, Clone)]
struct LedgerState {
    blocks: Vec<Block>,
    numbers_by_hash: HashMap<Hash, u64>,
    transactions: HashMap<Hash, TransactionRecord>,
    pending: Vec<Hash>,
    sources: HashMap<SourceId, SourceRecord>,
    identities: HashMap<PublicKey, IdentityRecord>,
    memberships: HashMap<PublicKey, MembershipRecord>,
    certifications: Vec<CertificationRecord>,
    monetary: MonetaryState,
}

impl LedgerState {
    fn append(&mut self, block: &Block, index: &[IndexEntry]) -> Result<(), StorageError> {
        let parent_ok = match self.blocks.last() {
            None => block.is_root(),
            Some(head) => {
                block.number == head.number + 1 && block.previous_hash == Some(head.hash())
            }
        };
        if !parent_ok {
            return Err(StorageError::ParentNotFound {
                height: block.number,
            });
        }

        for entry in index {
            self.apply(entry, block.median_time)?;
        }

        let written_on = block.blockstamp();
        for tx in &block.transactions {
            let hash = tx.hash();
            self.pending.retain(|pending| *pending != hash);
            self.transactions.insert(
                hash,
                TransactionRecord {
                    tx: tx.clone(),
                    written_on: Some(written_on),
                },
            );
        }

        self.numbers_by_hash.insert(written_on.hash, block.number);
        self.blocks.push(block.clone());
        self.update_monetary(block)
    }

    fn apply(&mut self, entry: &IndexEntry, median_time: u64) -> Result<(), StorageError> {
        match (&entry.op, &entry.kind) {
            (
                IndexOp::Create,
                IndexKind::Identity {
                    pubkey,
                    uid,
                    created_on,
                    member,
                },
            ) => {
                self.identities.insert(
                    *pubkey,
                    IdentityRecord {
                        pubkey: *pubkey,
                        uid: uid.clone().unwrap_or_default(),
                        created_on: created_on.unwrap_or_default(),
                        member: *member,
                        was_member: *member,
                        revoked: false,
                    },
                );
            }
            (IndexOp::Update, IndexKind::Identity { pubkey, member, .. }) => {
                let identity = self.identity_mut(pubkey)?;
                identity.member = *member;
                identity.was_member |= *member;
            }
            (
                IndexOp::Create | IndexOp::Update,
                IndexKind::Membership {
                    pubkey,
                    event,
                    expires_on,
                },
            ) => {
                if *event == MembershipEvent::Revoke {
                    self.identity_mut(pubkey)?.revoked = true;
                }
                self.memberships.insert(
                    *pubkey,
                    MembershipRecord {
                        pubkey: *pubkey,
                        last_event: *event,
                        expires_on: *expires_on,
                    },
                );
            }
            (
                IndexOp::Create | IndexOp::Update,
                IndexKind::Certification {
                    issuer,
                    receiver,
                    expires_on,
                },
            ) => {
                self.certifications
                    .retain(|cert| !(cert.issuer == *issuer && cert.receiver == *receiver));
                self.certifications.push(CertificationRecord {
                    issuer: *issuer,
                    receiver: *receiver,
                    expires_on: *expires_on,
                });
            }
            (
                IndexOp::Create,
                IndexKind::Source {
                    id,
                    amount,
                    base,
                    conditions,
                    consumed,
                },
            ) => {
                self.sources.insert(
                    *id,
                    SourceRecord {
                        id: *id,
                        amount: *amount,
                        base: *base,
                        conditions: conditions.clone(),
                        consumed: *consumed,
                        written_time: median_time,
                    },
                );
            }
            (IndexOp::Update, IndexKind::Source { id, consumed, .. }) => {
                let source = self.sources.get_mut(id).ok_or_else(|| {
                    StorageError::DataCorruption(format!("unknown source {:?}", id))
                })?;
                source.consumed = *consumed;
            }
            (IndexOp::Delete, IndexKind::Identity { pubkey, .. }) => {
                self.identities.remove(pubkey);
            }
            (IndexOp::Delete, IndexKind::Membership { pubkey, .. }) => {
                self.memberships.remove(pubkey);
            }
            (
                IndexOp::Delete,
                IndexKind::Certification {
                    issuer, receiver, ..
                },
            ) => {
                self.certifications
                    .retain(|cert| !(cert.issuer == *issuer && cert.receiver == *receiver));
            }
            (IndexOp::Delete, IndexKind::Source { id, .. }) => {
                self.sources.remove(id);
            }
        }
        Ok(())
    }

    fn identity_mut(&mut self, pubkey: &PublicKey) -> Result<&mut IdentityRecord, StorageError> {
        self.identities.get_mut(pubkey).ok_or_else(|| {
            StorageError::DataCorruption(format!("unknown identity {}", short(pubkey)))
        })
    }

    fn update_monetary(&mut self, block: &Block) -> Result<(), StorageError> {
        let dt = self
            .blocks
            .first()
            .and_then(|root| root.parameters.as_ref())
            .map(|params| params.dt)
            .ok_or_else(|| StorageError::DataCorruption("root block has no parameters".into()))?;

        let monetary = &mut self.monetary;
        monetary.members_count = block.members_count;
        monetary.mass = block.monetary_mass;
        if block.is_root() {
            monetary.next_dividend_time = Some(block.median_time.saturating_add(dt));
        }
        if let Some(amount) = block.dividend {
            monetary.last_dividend = Some(DividendRecord {
                amount,
                base: block.unit_base.unwrap_or(0),
                time: block.median_time,
            });
            monetary.next_dividend_time =
                monetary.next_dividend_time.map(|t| t.saturating_add(dt));
        }
        Ok(())
    }
}

/// In-memory ledger state.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    name: String,
    peers: Vec<PeerInfo>,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Peers advertised through [`RemoteContacter::list_peers`].
    pub fn with_peers(mut self, peers: Vec<PeerInfo>) -> Self {
        self.peers = peers;
        self
    }

    /// Number of blocks in the chain.
    pub fn height(&self) -> u64 {
        self.state.read().blocks.len() as u64
    }

    /// Unspent sources locked by exactly `SIG(pubkey)`.
    pub fn sources_of(&self, pubkey: &PublicKey) -> Vec<SourceRecord> {
        let conditions = format!("SIG({})", to_hex(pubkey));
        let mut sources: Vec<SourceRecord> = self
            .state
            .read()
            .sources
            .values()
            .filter(|source| !source.consumed && source.conditions == conditions)
            .cloned()
            .collect();
        sources.sort_by_key(|source| source.id);
        sources
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn current_block(&self) -> Result<Option<Block>, StorageError> {
        Ok(self.state.read().blocks.last().cloned())
    }

    async fn block_at(&self, number: u64) -> Result<Option<Block>, StorageError> {
        Ok(usize::try_from(number)
            .ok()
            .and_then(|n| self.state.read().blocks.get(n).cloned()))
    }

    async fn block_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError> {
        let state = self.state.read();
        Ok(state
            .numbers_by_hash
            .get(hash)
            .and_then(|number| state.blocks.get(*number as usize))
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
        pubkey: &PublicKey,
    ) -> Result<Option<MembershipRecord>, StorageError> {
        Ok(self.state.read().memberships.get(pubkey).cloned())
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

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn save_block(&self, block: &Block, index: &[IndexEntry]) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let mut next = state.clone();
        next.append(block, index)?;
        *state = next;
        debug!(
            number = block.number,
            entries = index.len(),
            transactions = block.transactions.len(),
            "Block saved"
        );
        Ok(())
    }

    async fn save_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let hash = tx.hash();
        let mut state = self.state.write();
        if state.transactions.contains_key(&hash) {
            return Ok(());
        }
        state.transactions.insert(
            hash,
            TransactionRecord {
                tx: tx.clone(),
                written_on: None,
            },
        );
        state.pending.push(hash);
        Ok(())
    }

    async fn pending_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        let state = self.state.read();
        Ok(state
            .pending
            .iter()
            .filter_map(|hash| state.transactions.get(hash))
            .map(|record| record.tx.clone())
            .collect())
    }

    async fn remove_pending(&self, hashes: &[Hash]) -> Result<(), StorageError> {
        let mut state = self.state.write();
        state.pending.retain(|pending| !hashes.contains(pending));
        for hash in hashes {
            if state.transactions.get(hash).is_some_and(|r| !r.is_written()) {
                state.transactions.remove(hash);
            }
        }
        debug!(count = hashes.len(), "Pending transactions removed");
        Ok(())
    }
}

#[async_trait]
impl RemoteContacter for InMemoryLedger {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_peers(&self) -> Result<Vec<PeerInfo>, StorageError> {
        Ok(self.peers.clone())
    }

    async fn get_current(&self) -> Result<Option<Block>, StorageError> {
        self.current_block().await
    }

    async fn get_block(&self, number: u64) -> Result<Option<Block>, StorageError> {
        self.block_at(number).await
    }

    async fn get_blocks(&self, count: u64, from: u64) -> Result<Vec<Block>, StorageError> {
        self.blocks_range(count, from).await
    }

    async fn get_requirements_pending(
        &self,
        min_certifications: usize,
    ) -> Result<Vec<PendingRequirement>, StorageError> {
        let state = self.state.read();
        let now = state.blocks.last().map_or(0, |head| head.median_time);
        let mut pending: Vec<PendingRequirement> = state
            .identities
            .values()
            .filter(|identity| !identity.member && !identity.revoked)
            .map(|identity| PendingRequirement {
                pubkey: identity.pubkey,
                uid: identity.uid.clone(),
                certifications: state
                    .certifications
                    .iter()
                    .filter(|cert| cert.receiver == identity.pubkey && cert.expires_on > now)
                    .count(),
            })
            .filter(|requirement| requirement.certifications >= min_certifications)
            .collect();
        pending.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Blockstamp, ConsensusParams};

    fn root() -> Block {
        Block {
            median_time: 1_000,
            time: 1_000,
            members_count: 1,
            parameters: Some(ConsensusParams {
                dt: 100,
                ..ConsensusParams::default()
            }),
            ..Block::default()
        }
    }

    fn entry(op: IndexOp, kind: IndexKind) -> IndexEntry {
        IndexEntry {
            op,
            position: 0,
            written_on: Blockstamp::default(),
            kind,
        }
    }

    fn identity(pubkey: PublicKey, member: bool) -> IndexKind {
        IndexKind::Identity {
            pubkey,
            uid: Some(format!("uid{}", pubkey[0])),
            created_on: None,
            member,
        }
    }

    #[tokio::test]
    async fn test_root_block_sets_dividend_schedule() {
        let ledger = InMemoryLedger::new("local");
        let index = vec![entry(IndexOp::Create, identity([1; 32], true))];
        ledger.save_block(&root(), &index).await.unwrap();

        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.members().await.unwrap(), vec![[1; 32]]);
        let monetary = ledger.monetary_state().await.unwrap();
        assert_eq!(monetary.next_dividend_time, Some(1_100));
        assert_eq!(monetary.members_count, 1);
    }

    #[tokio::test]
    async fn test_failed_entry_leaves_state_untouched() {
        let ledger = InMemoryLedger::new("local");
        let index = vec![
            entry(IndexOp::Create, identity([1; 32], true)),
            entry(
                IndexOp::Update,
                IndexKind::Source {
                    id: SourceId::Dividend {
                        issuer: [9; 32],
                        block_number: 0,
                    },
                    amount: 1,
                    base: 0,
                    conditions: String::new(),
                    consumed: true,
                },
            ),
        ];

        let err = ledger.save_block(&root(), &index).await.unwrap_err();
        assert!(matches!(err, StorageError::DataCorruption(_)));
        assert_eq!(ledger.height(), 0);
        assert!(ledger.identity(&[1; 32]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_block_not_on_head() {
        let ledger = InMemoryLedger::new("local");
        ledger.save_block(&root(), &[]).await.unwrap();

        let orphan = Block {
            number: 1,
            previous_hash: Some([0xAB; 32]),
            ..Block::default()
        };
        assert_eq!(
            ledger.save_block(&orphan, &[]).await,
            Err(StorageError::ParentNotFound { height: 1 })
        );
    }

    #[tokio::test]
    async fn test_pending_transactions_leave_on_write() {
        let ledger = InMemoryLedger::new("local");
        ledger.save_block(&root(), &[]).await.unwrap();
        let tx = Transaction {
            comment: "pending".into(),
            ..crate::testing::empty_transaction()
        };

        ledger.save_transaction(&tx).await.unwrap();
        ledger.save_transaction(&tx).await.unwrap();
        assert_eq!(ledger.pending_transactions().await.unwrap().len(), 1);

        let head = ledger.current_block().await.unwrap().unwrap();
        let next = Block {
            number: 1,
            previous_hash: Some(head.hash()),
            transactions: vec![tx.clone()],
            ..Block::default()
        };
        ledger.save_block(&next, &[]).await.unwrap();

        assert!(ledger.pending_transactions().await.unwrap().is_empty());
        let record = ledger.transaction_by_hash(&tx.hash()).await.unwrap().unwrap();
        assert!(record.is_written());
    }

    #[tokio::test]
    async fn test_remove_pending_spares_written_transactions() {
        let ledger = InMemoryLedger::new("local");
        ledger.save_block(&root(), &[]).await.unwrap();
        let written = Transaction {
            comment: "written".into(),
            ..crate::testing::empty_transaction()
        };
        let stale = Transaction {
            comment: "stale".into(),
            ..crate::testing::empty_transaction()
        };
        ledger.save_transaction(&stale).await.unwrap();
        let head = ledger.current_block().await.unwrap().unwrap();
        let next = Block {
            number: 1,
            previous_hash: Some(head.hash()),
            transactions: vec![written.clone()],
            ..Block::default()
        };
        ledger.save_block(&next, &[]).await.unwrap();

        ledger
            .remove_pending(&[stale.hash(), written.hash()])
            .await
            .unwrap();
        assert!(ledger.pending_transactions().await.unwrap().is_empty());
        assert_eq!(ledger.transaction_by_hash(&stale.hash()).await.unwrap(), None);
        let record = ledger.transaction_by_hash(&written.hash()).await.unwrap();
        assert!(record.unwrap().is_written());

        // Evicted transactions may be saved again later.
        ledger.save_transaction(&stale).await.unwrap();
        assert_eq!(ledger.pending_transactions().await.unwrap(), vec![stale]);
    }

    #[tokio::test]
    async fn test_requirements_pending_counts_valid_certifications() {
        let ledger = InMemoryLedger::new("local").with_peers(vec![PeerInfo {
            pubkey: [5; 32],
            endpoint: "127.0.0.1:10901".into(),
        }]);
        let index = vec![
            entry(IndexOp::Create, identity([1; 32], true)),
            entry(IndexOp::Create, identity([2; 32], false)),
            entry(
                IndexOp::Create,
                IndexKind::Certification {
                    issuer: [1; 32],
                    receiver: [2; 32],
                    expires_on: 5_000,
                },
            ),
        ];
        ledger.save_block(&root(), &index).await.unwrap();

        let pending = ledger.get_requirements_pending(1).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].pubkey, [2; 32]);
        assert!(ledger.get_requirements_pending(2).await.unwrap().is_empty());
        assert_eq!(ledger.list_peers().await.unwrap().len(), 1);
        assert_eq!(ledger.get_blocks(10, 0).await.unwrap().len(), 1);
    }
}
