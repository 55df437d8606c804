//! Transaction submission.

use super::{
    chain_params, log_rejection, unexpected_outcome, CommitKey, CommitPipeline, Committed,
    DocumentConfig, DocumentDependencies, PENDING_TX_TIME_LOOKAHEAD,
};
use crate::ports::inbound::TransactionApi;
use crate::ports::outbound::{AdmissionDelegate, LedgerStore};
use async_trait::async_trait;
use lc_01_rules::{RuleEngine, TxContext};
use shared_bus::{EventPublisher, LedgerEvent};
use shared_types::{short, LedgerError, SignatureVerifier, Transaction};
use std::sync::Arc;
use tracing::{debug, info, Instrument, Span};

/// Validates pending transactions against the head and admits them to the
/// pool.
pub struct TransactionService<S, A, V, P> {
    deps: DocumentDependencies<S, A, V, P>,
    config: Arc<DocumentConfig>,
    pipeline: Arc<CommitPipeline>,
    span: Span,
}

impl<S, A, V, P> TransactionService<S, A, V, P>
where
    S: LedgerStore + 'static,
    A: AdmissionDelegate + 'static,
    V: SignatureVerifier + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(
        deps: DocumentDependencies<S, A, V, P>,
        config: Arc<DocumentConfig>,
        pipeline: Arc<CommitPipeline>,
        span: Span,
    ) -> Self {
        Self {
            deps,
            config,
            pipeline,
            span,
        }
    }

    /// Submit `tx`; concurrent submissions of the same hash share one
    /// outcome.
    pub async fn submit(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        let hash = tx.hash();
        debug!(tx = %short(&hash), "Transaction submitted");

        let deps = self.deps.clone();
        let config = Arc::clone(&self.config);
        let unit = async move {
            let id = short(&hash);
            let outcome = accept(&deps, &config, tx).await;
            let event = match &outcome {
                Ok(tx) => {
                    info!(tx = %id, inputs = tx.inputs.len(), "Transaction accepted");
                    LedgerEvent::TransactionAccepted(tx.clone())
                }
                Err(err) => {
                    log_rejection("transaction", &id, err);
                    LedgerEvent::transaction_rejected(hash, err)
                }
            };
            deps.publisher.publish(event).await;
            outcome.map(Committed::Transaction)
        }
        .instrument(self.span.clone());

        match self.pipeline.submit(CommitKey::Transaction(hash), unit).await? {
            Committed::Transaction(tx) => Ok(tx),
            Committed::Block(_) => Err(unexpected_outcome()),
        }
    }
}

async fn accept<S, A, V, P>(
    deps: &DocumentDependencies<S, A, V, P>,
    config: &DocumentConfig,
    tx: Transaction,
) -> Result<Transaction, LedgerError>
where
    S: LedgerStore,
    A: AdmissionDelegate,
    V: SignatureVerifier,
{
    let hash = tx.hash();
    let known = deps.store.transaction_by_hash(&hash).await?.is_some()
        || deps.admission.contains(&hash).await;
    if known {
        return Err(LedgerError::AlreadyProcessed(hash));
    }

    let head = deps
        .store
        .current_block()
        .await?
        .ok_or(LedgerError::NoCurrentState)?;
    let params = chain_params(deps.store.as_ref(), &config.params).await?;
    let ctx = TxContext {
        params: &params,
        reader: deps.store.as_ref(),
        verifier: deps.verifier.as_ref(),
        median_time: head.median_time + PENDING_TX_TIME_LOOKAHEAD,
    };
    RuleEngine::check_global_transaction(&tx, &ctx).await?;

    if !deps.admission.try_admit(&tx, &config.node_pubkey).await {
        return Err(LedgerError::CapacityExceeded);
    }
    if let Err(err) = deps.store.save_transaction(&tx).await {
        deps.admission.forget(&[hash]).await;
        return Err(err.into());
    }
    Ok(tx)
}

#[async_trait]
impl<S, A, V, P> TransactionApi for TransactionService<S, A, V, P>
where
    S: LedgerStore + 'static,
    A: AdmissionDelegate + 'static,
    V: SignatureVerifier + 'static,
    P: EventPublisher + 'static,
{
    async fn submit_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        self.submit(tx).await
    }
}
