//! Block submission.

use super::{
    chain_params, log_rejection, unexpected_outcome, CommitKey, CommitPipeline, Committed,
    DocumentConfig, DocumentDependencies, PENDING_TX_TIME_LOOKAHEAD,
};
use crate::ports::inbound::BlockApi;
use crate::ports::outbound::{AdmissionDelegate, LedgerStore};
use async_trait::async_trait;
use lc_01_rules::{GlobalContext, RuleContext, RuleEngine, TxContext, ALL_GLOBAL, ALL_LOCAL};
use lc_02_indexer::global_index;
use shared_bus::{EventPublisher, LedgerEvent};
use shared_types::{
    short, Block, Blockstamp, ConsensusParams, Hash, LedgerError, SignatureVerifier, Transaction,
};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument, Span};

/// Validates candidate blocks against the head and appends them.
pub struct BlockService<S, A, V, P> {
    deps: DocumentDependencies<S, A, V, P>,
    config: Arc<DocumentConfig>,
    pipeline: Arc<CommitPipeline>,
    span: Span,
}

impl<S, A, V, P> BlockService<S, A, V, P>
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

    /// Submit `block`; concurrent submissions of the same hash share one
    /// outcome.
    pub async fn submit(&self, block: Block) -> Result<Blockstamp, LedgerError> {
        let blockstamp = block.blockstamp();
        debug!(block = %blockstamp, "Block submitted");

        let deps = self.deps.clone();
        let config = Arc::clone(&self.config);
        let unit = async move {
            let id = blockstamp.to_string();
            let outcome = accept(&deps, &config, &block).await;
            let event = match &outcome {
                Ok(written) => {
                    info!(
                        block = %id,
                        transactions = written.len(),
                        members = block.members_count,
                        "Block accepted"
                    );
                    LedgerEvent::BlockAccepted {
                        blockstamp,
                        issuer: block.issuer,
                        transactions: written.clone(),
                    }
                }
                Err(err) => {
                    log_rejection("block", &id, err);
                    LedgerEvent::block_rejected(blockstamp, err)
                }
            };
            deps.publisher.publish(event).await;
            outcome.map(|_| Committed::Block(blockstamp))
        }
        .instrument(self.span.clone());

        match self.pipeline.submit(CommitKey::Block(blockstamp.hash), unit).await? {
            Committed::Block(stamp) => Ok(stamp),
            Committed::Transaction(_) => Err(unexpected_outcome()),
        }
    }
}

/// Validate, index and persist `block`. Returns the hashes of the
/// transactions it wrote.
async fn accept<S, A, V, P>(
    deps: &DocumentDependencies<S, A, V, P>,
    config: &DocumentConfig,
    block: &Block,
) -> Result<Vec<Hash>, LedgerError>
where
    S: LedgerStore,
    A: AdmissionDelegate,
    V: SignatureVerifier,
{
    let hash = block.hash();
    if deps.store.block_by_hash(&hash).await?.is_some() {
        return Err(LedgerError::AlreadyProcessed(hash));
    }

    let head = deps.store.current_block().await?;
    let params = match (&head, &block.parameters) {
        (None, Some(params)) if block.is_root() => params.clone(),
        (None, _) if !block.is_root() => return Err(LedgerError::NoCurrentState),
        _ => chain_params(deps.store.as_ref(), &config.params).await?,
    };

    let local = RuleContext {
        params: &params,
        verifier: deps.verifier.as_ref(),
    };
    RuleEngine::check_local(ALL_LOCAL, block, &local)?;

    let global = GlobalContext {
        params: &params,
        head: head.as_ref(),
        reader: deps.store.as_ref(),
        verifier: deps.verifier.as_ref(),
    };
    RuleEngine::check_global(ALL_GLOBAL, block, &global).await?;

    let index = global_index(block, &params, deps.store.as_ref()).await?;
    deps.store.save_block(block, &index).await?;

    let written: Vec<Hash> = block.transactions.iter().map(Transaction::hash).collect();
    deps.admission.forget(&written).await;
    match evict_stale_pending(deps, &params, block).await {
        Ok(evicted) if !evicted.is_empty() => {
            info!(evicted = evicted.len(), "Stale pending transactions dropped");
        }
        Ok(_) => {}
        Err(err) => {
            warn!(block = %block.blockstamp(), error = %err, "Pending pool cleanup failed");
        }
    }
    Ok(written)
}

/// Re-check every pending transaction against the new head and drop the
/// ones it invalidates, such as spends of consumed sources or expired
/// anchors. Returns the evicted hashes.
async fn evict_stale_pending<S, A, V, P>(
    deps: &DocumentDependencies<S, A, V, P>,
    params: &ConsensusParams,
    head: &Block,
) -> Result<Vec<Hash>, LedgerError>
where
    S: LedgerStore,
    A: AdmissionDelegate,
    V: SignatureVerifier,
{
    let ctx = TxContext {
        params,
        reader: deps.store.as_ref(),
        verifier: deps.verifier.as_ref(),
        median_time: head.median_time + PENDING_TX_TIME_LOOKAHEAD,
    };
    let mut stale = Vec::new();
    for tx in deps.store.pending_transactions().await? {
        match RuleEngine::check_global_transaction(&tx, &ctx).await {
            Ok(()) => {}
            Err(LedgerError::Validation(violation)) => {
                let hash = tx.hash();
                debug!(
                    tx = %short(&hash),
                    reason = %violation.message,
                    "Pending transaction evicted"
                );
                stale.push(hash);
            }
            Err(err) => return Err(err),
        }
    }
    if !stale.is_empty() {
        deps.store.remove_pending(&stale).await?;
        deps.admission.forget(&stale).await;
    }
    Ok(stale)
}

#[async_trait]
impl<S, A, V, P> BlockApi for BlockService<S, A, V, P>
where
    S: LedgerStore + 'static,
    A: AdmissionDelegate + 'static,
    V: SignatureVerifier + 'static,
    P: EventPublisher + 'static,
{
    async fn submit_block(&self, block: Block) -> Result<Blockstamp, LedgerError> {
        self.submit(block).await
    }
}
