//! # Index Entries
//!
//! Typed descriptions of the state transitions a block causes. Entries are
//! consumed by the persistence layer; nothing here applies them.

use serde::{Deserialize, Serialize};
use shared_types::{Blockstamp, MembershipEvent, PublicKey, SourceId};

/// Operation an entry performs on its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexOp {
    Create,
    Update,
    Delete,
}

/// Entry categories, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexCategory {
    Identity,
    Membership,
    Certification,
    Source,
}

/// What an entry changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Identity {
        pubkey: PublicKey,
        /// Set on creation only.
        uid: Option<String>,
        created_on: Option<Blockstamp>,
        member: bool,
    },
    Membership {
        pubkey: PublicKey,
        event: MembershipEvent,
        expires_on: Option<u64>,
    },
    Certification {
        issuer: PublicKey,
        receiver: PublicKey,
        expires_on: u64,
    },
    Source {
        id: SourceId,
        amount: u64,
        base: u32,
        /// Empty on consumption entries until resolved by the global index.
        conditions: String,
        consumed: bool,
    },
}

impl IndexKind {
    pub fn category(&self) -> IndexCategory {
        match self {
            IndexKind::Identity { .. } => IndexCategory::Identity,
            IndexKind::Membership { .. } => IndexCategory::Membership,
            IndexKind::Certification { .. } => IndexCategory::Certification,
            IndexKind::Source { .. } => IndexCategory::Source,
        }
    }
}

/// One state transition implied by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub op: IndexOp,
    /// Ordinal of the triggering sub-document within the block.
    pub position: usize,
    /// Block causing the transition.
    pub written_on: Blockstamp,
    pub kind: IndexKind,
}

impl IndexEntry {
    pub fn category(&self) -> IndexCategory {
        self.kind.category()
    }

    fn sort_key(&self) -> (IndexCategory, usize) {
        (self.category(), self.position)
    }
}

/// Sort entries by (category, position). Stable, so entries sharing a key
/// keep their emission order.
pub fn sort_entries(entries: &mut [IndexEntry]) {
    entries.sort_by_key(IndexEntry::sort_key);
}
