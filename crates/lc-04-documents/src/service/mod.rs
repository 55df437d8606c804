//! # Document Services
//!
//! Transaction and block services sharing one commit pipeline.
//!
//! ## Architecture
//!
//! Both services:
//! 1. Wrap each submission into a unit keyed by the document hash
//! 2. Run it through the shared [`CommitPipeline`], so validation always
//!    sees the state left by the previous commit
//! 3. Publish the accept or reject event from inside the unit
//! 4. Receive their collaborators through [`DocumentDependencies`]

mod block;
mod pending;
mod transaction;

pub use block::BlockService;
pub use pending::PendingTransactions;
pub use transaction::TransactionService;

use crate::ports::outbound::{AdmissionDelegate, LedgerStore};
use lc_03_fifo::FifoPipeline;
use serde::{Deserialize, Serialize};
use shared_bus::EventPublisher;
use shared_types::{
    Blockstamp, ConsensusParams, Hash, LedgerError, LedgerReader, PublicKey, SignatureVerifier,
    StorageError, Transaction,
};
use std::sync::Arc;
use tracing::{error, info, Span};

/// Pending transactions are checked as if written in the next block, whose
/// median time is at least one second past the head's.
pub const PENDING_TX_TIME_LOOKAHEAD: u64 = 1;

/// Deduplication key of a commit unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitKey {
    Transaction(Hash),
    Block(Hash),
}

/// Successful outcome of a commit unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Committed {
    Transaction(Transaction),
    Block(Blockstamp),
}

/// Pipeline shared by the transaction and block services.
pub type CommitPipeline = FifoPipeline<CommitKey, Committed, LedgerError>;

/// Settings of the document services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Parameters used until a root block defines the chain's own.
    pub params: ConsensusParams,
    /// Public key of the running node; its transactions bypass the pool
    /// capacity.
    pub node_pubkey: PublicKey,
}

/// Collaborators of the document services.
pub struct DocumentDependencies<S, A, V, P> {
    pub store: Arc<S>,
    pub admission: Arc<A>,
    pub verifier: Arc<V>,
    pub publisher: Arc<P>,
}

impl<S, A, V, P> Clone for DocumentDependencies<S, A, V, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            admission: Arc::clone(&self.admission),
            verifier: Arc::clone(&self.verifier),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

/// Both services wired to one pipeline.
pub struct DocumentServices<S, A, V, P> {
    pub transactions: TransactionService<S, A, V, P>,
    pub blocks: BlockService<S, A, V, P>,
    pub pipeline: Arc<CommitPipeline>,
}

impl<S, A, V, P> DocumentServices<S, A, V, P>
where
    S: LedgerStore + 'static,
    A: AdmissionDelegate + 'static,
    V: SignatureVerifier + 'static,
    P: EventPublisher + 'static,
{
    /// Must be called inside a tokio runtime.
    pub fn new(deps: DocumentDependencies<S, A, V, P>, config: DocumentConfig, span: Span) -> Self {
        let pipeline = Arc::new(CommitPipeline::new());
        let config = Arc::new(config);
        Self {
            transactions: TransactionService::new(
                deps.clone(),
                Arc::clone(&config),
                Arc::clone(&pipeline),
                span.clone(),
            ),
            blocks: BlockService::new(deps, config, Arc::clone(&pipeline), span),
            pipeline,
        }
    }
}

/// Parameters of the running chain: the root block's, or the configured
/// ones before there is a root.
pub(crate) async fn chain_params(
    reader: &dyn LedgerReader,
    configured: &ConsensusParams,
) -> Result<ConsensusParams, StorageError> {
    Ok(reader
        .block_at(0)
        .await?
        .and_then(|root| root.parameters)
        .unwrap_or_else(|| configured.clone()))
}

/// Rejections are routine; only internal failures are errors.
pub(crate) fn log_rejection(document: &'static str, id: &str, err: &LedgerError) {
    match err {
        LedgerError::Internal(reason) => {
            error!(document, id, reason = %reason, "Commit failed");
        }
        LedgerError::Validation(violation) => {
            info!(
                document,
                id,
                rule = violation.rule,
                reason = %violation.message,
                "Document rejected"
            );
        }
        other => info!(document, id, error = %other, "Document rejected"),
    }
}

pub(crate) fn unexpected_outcome() -> LedgerError {
    LedgerError::Internal("commit unit returned the wrong outcome kind".into())
}
