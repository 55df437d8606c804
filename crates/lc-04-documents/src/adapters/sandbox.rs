//! # Transaction Sandbox
//!
//! Bounded pending pool implementing [`AdmissionDelegate`].
//!
//! | Case | Decision |
//! |------|----------|
//! | hash already held | admitted (no new slot) |
//! | node key among the issuers | admitted, even when full |
//! | pool below capacity | admitted |
//! | pool full | refused |

use crate::ports::AdmissionDelegate;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{short, Hash, PublicKey, Transaction};
use std::collections::HashSet;
use tracing::debug;

/// Default number of pending transactions a sandbox holds.
pub const DEFAULT_SANDBOX_CAPACITY: usize = 200;

#[derive(Debug)]
pub struct TransactionSandbox {
    capacity: usize,
    admitted: RwLock<HashSet<Hash>>,
}

impl TransactionSandbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            admitted: RwLock::new(HashSet::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.admitted.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.read().is_empty()
    }
}

impl Default for TransactionSandbox {
    fn default() -> Self {
        Self::new(DEFAULT_SANDBOX_CAPACITY)
    }
}

#[async_trait]
impl AdmissionDelegate for TransactionSandbox {
    async fn try_admit(&self, tx: &Transaction, node: &PublicKey) -> bool {
        let hash = tx.hash();
        let mut admitted = self.admitted.write();
        if admitted.contains(&hash) {
            return true;
        }
        let own = tx.issuers.contains(node);
        if admitted.len() >= self.capacity && !own {
            debug!(tx = %short(&hash), capacity = self.capacity, "Sandbox full");
            return false;
        }
        admitted.insert(hash);
        true
    }

    async fn contains(&self, hash: &Hash) -> bool {
        self.admitted.read().contains(hash)
    }

    async fn forget(&self, hashes: &[Hash]) {
        let mut admitted = self.admitted.write();
        for hash in hashes {
            admitted.remove(hash);
        }
    }
}
