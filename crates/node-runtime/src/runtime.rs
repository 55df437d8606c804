//! Wiring of the ledger core.
//!
//! ```text
//!            ┌───────────── DocumentServices ─────────────┐
//! submit ──► │ TransactionService ─┐                      │
//!            │                     ├─► CommitPipeline ──► InMemoryLedger
//! submit ──► │ BlockService ───────┘         │            │
//!            └───────────────────────────────┼────────────┘
//!                                            ▼
//!                                   InMemoryEventBus ──► pending feed
//! ```

use crate::config::{ConfigError, NodeConfig};
use lc_04_documents::{
    BlockService, DocumentConfig, DocumentDependencies, DocumentServices, InMemoryLedger,
    PendingTransactions, TransactionSandbox, TransactionService,
};
use shared_bus::InMemoryEventBus;
use shared_crypto::Ed25519Verifier;
use shared_types::{short, PublicKey};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span};

type Services =
    DocumentServices<InMemoryLedger, TransactionSandbox, Ed25519Verifier, InMemoryEventBus>;

/// A running single-node ledger core.
pub struct NodeRuntime {
    config: NodeConfig,
    node_pubkey: PublicKey,
    ledger: Arc<InMemoryLedger>,
    sandbox: Arc<TransactionSandbox>,
    bus: Arc<InMemoryEventBus>,
    services: Services,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Build every component. Must be called inside a tokio runtime.
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let node_pubkey = config.node.keypair()?.public_key();
        info!(
            currency = %config.ledger.currency,
            node = %short(&node_pubkey),
            pool_capacity = config.pool.capacity,
            "Creating ledger core"
        );

        let ledger = Arc::new(InMemoryLedger::new(config.ledger.currency.clone()));
        let sandbox = Arc::new(TransactionSandbox::new(config.pool.capacity));
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let deps = DocumentDependencies {
            store: Arc::clone(&ledger),
            admission: Arc::clone(&sandbox),
            verifier: Arc::new(Ed25519Verifier),
            publisher: Arc::clone(&bus),
        };
        let documents = DocumentConfig {
            params: config.ledger.params.clone(),
            node_pubkey,
        };
        let span = info_span!("documents", currency = %config.ledger.currency);
        let services = DocumentServices::new(deps, documents, span);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            node_pubkey,
            ledger,
            sandbox,
            bus,
            services,
            shutdown_tx,
        })
    }

    /// Spawn the pending-transaction logger. It stops on [`Self::shutdown`].
    pub fn start(&self) -> JoinHandle<()> {
        let mut feed = PendingTransactions::new(&self.bus);
        let mut shutdown = self.shutdown_tx.subscribe();
        let sandbox = Arc::clone(&self.sandbox);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    batch = feed.next_batch() => match batch {
                        Some(batch) => debug!(
                            admitted = batch.len(),
                            pooled = sandbox.len(),
                            "Pending transactions"
                        ),
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
            debug!("Pending feed stopped");
        })
    }

    pub fn shutdown(&self) {
        info!(height = self.ledger.height(), "Shutting down ledger core");
        let _ = self.shutdown_tx.send(true);
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn node_pubkey(&self) -> PublicKey {
        self.node_pubkey
    }

    pub fn ledger(&self) -> Arc<InMemoryLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn transactions(
        &self,
    ) -> &TransactionService<InMemoryLedger, TransactionSandbox, Ed25519Verifier, InMemoryEventBus>
    {
        &self.services.transactions
    }

    pub fn blocks(
        &self,
    ) -> &BlockService<InMemoryLedger, TransactionSandbox, Ed25519Verifier, InMemoryEventBus> {
        &self.services.blocks
    }
}
