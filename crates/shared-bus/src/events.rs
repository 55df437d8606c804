//! # Ledger Events
//!
//! Accept/reject outcomes published by the document services from inside
//! the committing pipeline unit.

use serde::{Deserialize, Serialize};
use shared_types::{Blockstamp, ErrorKind, Hash, LedgerError, PublicKey, Transaction};

/// Every event that flows through the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A transaction entered the pending pool.
    TransactionAccepted(Transaction),

    /// A transaction submission failed.
    TransactionRejected {
        hash: Hash,
        kind: ErrorKind,
        reason: String,
    },

    /// A block was validated and persisted.
    BlockAccepted {
        blockstamp: Blockstamp,
        issuer: PublicKey,
        /// Hashes of the transactions the block wrote.
        transactions: Vec<Hash>,
    },

    /// A block submission failed.
    BlockRejected {
        blockstamp: Blockstamp,
        kind: ErrorKind,
        reason: String,
    },
}

impl LedgerEvent {
    pub fn transaction_rejected(hash: Hash, error: &LedgerError) -> Self {
        LedgerEvent::TransactionRejected {
            hash,
            kind: error.kind(),
            reason: error.to_string(),
        }
    }

    pub fn block_rejected(blockstamp: Blockstamp, error: &LedgerError) -> Self {
        LedgerEvent::BlockRejected {
            blockstamp,
            kind: error.kind(),
            reason: error.to_string(),
        }
    }

    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            LedgerEvent::TransactionAccepted(_) | LedgerEvent::TransactionRejected { .. } => {
                EventTopic::Transactions
            }
            LedgerEvent::BlockAccepted { .. } | LedgerEvent::BlockRejected { .. } => {
                EventTopic::Blocks
            }
        }
    }

    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerEvent::TransactionRejected { .. } | LedgerEvent::BlockRejected { .. }
        )
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Transactions,
    Blocks,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Skip rejection events.
    pub accepted_only: bool,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            accepted_only: false,
        }
    }

    /// Restrict the filter to acceptance events.
    #[must_use]
    pub fn accepted_only(mut self) -> Self {
        self.accepted_only = true;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        topic_match && !(self.accepted_only && event.is_rejection())
    }
}
