//! # Shared Ports
//!
//! Capabilities every rule-evaluating crate consumes. Adapters live
//! elsewhere; this crate only names the contracts.

use crate::documents::{Block, SourceId};
use crate::entities::{Hash, PublicKey, Signature};
use crate::errors::StorageError;
use crate::records::{
    CertificationRecord, IdentityRecord, MembershipRecord, MonetaryState, SourceRecord,
    TransactionRecord,
};
use async_trait::async_trait;

/// Read access to persisted ledger state.
///
/// Implementations may suspend on I/O. They must reflect every block and
/// transaction saved before the call.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Current chain head, `None` before the root block is saved.
    async fn current_block(&self) -> Result<Option<Block>, StorageError>;

    async fn block_at(&self, number: u64) -> Result<Option<Block>, StorageError>;

    async fn block_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError>;

    /// Up to `count` consecutive blocks starting at `from`.
    async fn blocks_range(&self, count: u64, from: u64) -> Result<Vec<Block>, StorageError>;

    /// A transaction either written in a block or saved as pending.
    async fn transaction_by_hash(
        &self,
        hash: &Hash,
    ) -> Result<Option<TransactionRecord>, StorageError>;

    async fn source(&self, id: &SourceId) -> Result<Option<SourceRecord>, StorageError>;

    async fn identity(&self, pubkey: &PublicKey) -> Result<Option<IdentityRecord>, StorageError>;

    async fn identity_by_uid(&self, uid: &str) -> Result<Option<IdentityRecord>, StorageError>;

    async fn membership(
        &self,
        pubkey: &PublicKey,
    ) -> Result<Option<MembershipRecord>, StorageError>;

    /// Pubkeys of current members, sorted.
    async fn members(&self) -> Result<Vec<PublicKey>, StorageError>;

    /// Certifications received by `receiver`, including expired ones.
    async fn certifications_to(
        &self,
        receiver: &PublicKey,
    ) -> Result<Vec<CertificationRecord>, StorageError>;

    async fn monetary_state(&self) -> Result<MonetaryState, StorageError>;
}

/// Signature verification contract.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, signature: &Signature, message: &[u8], key: &PublicKey) -> bool;
}
