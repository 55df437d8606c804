//! # Document Services (lc-04)
//!
//! Entry points accepting transactions and blocks into the ledger.
//!
//! ## Commit Flow
//!
//! ```text
//! submit_transaction ─┐                    ┌─ rules (lc-01) ──┐
//!                     ├─► FIFO (lc-03) ───►┤                  ├─► store ─► event bus
//! submit_block ───────┘   keyed by hash    └─ index (lc-02) ──┘
//! ```
//!
//! | Step | Transaction | Block |
//! |------|-------------|-------|
//! | Duplicate | history or pool holds the hash | stored block with the hash |
//! | Head | required | required unless root |
//! | Rules | single-transaction global check at head median time + 1 | every local rule, then every global rule |
//! | Admission | pool capacity, node's own transactions exempt | - |
//! | Persist | pending transaction | block and its index |
//! | Event | `TransactionAccepted` / `TransactionRejected` | `BlockAccepted` / `BlockRejected` |
//!
//! ## Adapters
//!
//! - [`InMemoryLedger`]: ledger state and synchronization source in memory
//! - [`TransactionSandbox`]: bounded pending pool
//!
//! The `test-utils` feature exposes [`testing`], which builds valid chains
//! for tests of other crates.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::{InMemoryLedger, TransactionSandbox, DEFAULT_SANDBOX_CAPACITY};
pub use ports::{
    AdmissionDelegate, BlockApi, LedgerStore, PeerInfo, PendingRequirement, RemoteContacter,
    TransactionApi,
};
pub use service::{
    BlockService, CommitKey, CommitPipeline, Committed, DocumentConfig, DocumentDependencies,
    DocumentServices, PendingTransactions, TransactionService, PENDING_TX_TIME_LOOKAHEAD,
};
