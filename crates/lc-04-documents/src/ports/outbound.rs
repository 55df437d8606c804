//! Outbound (driven) ports for the document services.
//!
//! Implemented by adapters in this crate for tests and single-node runs,
//! and by persistence or network layers in a full node.

use async_trait::async_trait;
use lc_02_indexer::IndexEntry;
use serde::{Deserialize, Serialize};
use shared_types::{Block, Hash, LedgerReader, PublicKey, StorageError, Transaction};

/// Persistence write access on top of the shared read access.
///
/// Writes are only ever issued from inside a pipeline unit, one at a time.
#[async_trait]
pub trait LedgerStore: LedgerReader {
    /// Append `block` as the new head and apply its index entries in order.
    ///
    /// Either every entry is applied or none is.
    async fn save_block(&self, block: &Block, index: &[IndexEntry]) -> Result<(), StorageError>;

    /// Record a transaction as pending.
    async fn save_transaction(&self, tx: &Transaction) -> Result<(), StorageError>;

    /// Pending transactions, oldest first.
    async fn pending_transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Drop pending transactions that can no longer be written. Written
    /// transactions are left alone.
    async fn remove_pending(&self, hashes: &[Hash]) -> Result<(), StorageError>;
}

/// Admission policy of the bounded pending pool.
#[async_trait]
pub trait AdmissionDelegate: Send + Sync {
    /// Try to reserve a pool slot for `tx` on behalf of the node identified
    /// by `node`. `false` means the pool refuses it.
    async fn try_admit(&self, tx: &Transaction, node: &PublicKey) -> bool;

    /// Whether the pool holds a transaction with this hash.
    async fn contains(&self, hash: &Hash) -> bool;

    /// Release the slots of transactions written in a block or evicted.
    async fn forget(&self, hashes: &[Hash]);
}

/// A peer known to a synchronization source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub pubkey: PublicKey,
    pub endpoint: String,
}

/// An identity waiting for enough certifications to join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequirement {
    pub pubkey: PublicKey,
    pub uid: String,
    /// Valid certifications received so far.
    pub certifications: usize,
}

/// Synchronization source contract offered to remote peers.
#[async_trait]
pub trait RemoteContacter: Send + Sync {
    fn name(&self) -> String;

    async fn list_peers(&self) -> Result<Vec<PeerInfo>, StorageError>;

    async fn get_current(&self) -> Result<Option<Block>, StorageError>;

    async fn get_block(&self, number: u64) -> Result<Option<Block>, StorageError>;

    async fn get_blocks(&self, count: u64, from: u64) -> Result<Vec<Block>, StorageError>;

    /// Non-member identities holding at least `min_certifications` valid
    /// certifications.
    async fn get_requirements_pending(
        &self,
        min_certifications: usize,
    ) -> Result<Vec<PendingRequirement>, StorageError>;
}
