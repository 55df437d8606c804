//! Pending-transaction feed.

use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, LedgerEvent, Subscription};
use shared_types::Transaction;

/// Batches of newly admitted transactions, in admission order.
///
/// Only transactions admitted after the feed was created are seen.
pub struct PendingTransactions {
    subscription: Subscription,
}

impl PendingTransactions {
    pub fn new(bus: &InMemoryEventBus) -> Self {
        let filter = EventFilter::topics(vec![EventTopic::Transactions]).accepted_only();
        Self {
            subscription: bus.subscribe(filter),
        }
    }

    /// Wait for at least one admitted transaction, then drain whatever else
    /// is already buffered. `None` once the bus is gone.
    pub async fn next_batch(&mut self) -> Option<Vec<Transaction>> {
        let mut batch = Vec::new();
        push_admitted(&mut batch, self.subscription.recv().await?);
        while let Ok(Some(event)) = self.subscription.try_recv() {
            push_admitted(&mut batch, event);
        }
        Some(batch)
    }
}

fn push_admitted(batch: &mut Vec<Transaction>, event: LedgerEvent) {
    if let LedgerEvent::TransactionAccepted(tx) = event {
        batch.push(tx);
    }
}
