//! Inbound (driving) ports: what network and API layers call.

use async_trait::async_trait;
use shared_types::{Block, Blockstamp, LedgerError, Transaction};

#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Validate and admit a transaction into the pending pool.
    ///
    /// Concurrent submissions of the same transaction share one outcome.
    async fn submit_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError>;
}

#[async_trait]
pub trait BlockApi: Send + Sync {
    /// Validate, index and persist a block on top of the current head.
    async fn submit_block(&self, block: Block) -> Result<Blockstamp, LedgerError>;
}
