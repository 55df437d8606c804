//! Read models returned by the ledger state reader.
//!
//! These describe the *current* derived state, after every persisted block
//! has been applied. They are what global rules and the global indexer
//! consult.

use crate::documents::{SourceId, Transaction};
use crate::entities::{Blockstamp, PublicKey};
use serde::{Deserialize, Serialize};

/// A transaction known to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx: Transaction,
    /// Block the transaction was written in; `None` while pending.
    pub written_on: Option<Blockstamp>,
}

impl TransactionRecord {
    pub fn is_written(&self) -> bool {
        self.written_on.is_some()
    }
}

/// A spendable (or spent) source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: SourceId,
    pub amount: u64,
    pub base: u32,
    pub conditions: String,
    pub consumed: bool,
    /// Median time of the block that created the source.
    pub written_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub pubkey: PublicKey,
    pub uid: String,
    pub created_on: Blockstamp,
    pub member: bool,
    pub was_member: bool,
    pub revoked: bool,
}

/// Membership state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipEvent {
    /// `first` is `None` until resolved against history.
    Join { first: Option<bool> },
    Renew,
    Leave,
    Revoke,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub pubkey: PublicKey,
    pub last_event: MembershipEvent,
    pub expires_on: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRecord {
    pub issuer: PublicKey,
    pub receiver: PublicKey,
    pub expires_on: u64,
}

/// The last dividend created on the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub amount: u64,
    pub base: u32,
    /// Median time of the block that carried it.
    pub time: u64,
}

/// Monetary aggregates as of the current head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryState {
    pub last_dividend: Option<DividendRecord>,
    /// Median time from which the next dividend is due; `None` before root.
    pub next_dividend_time: Option<u64>,
    /// Total money created, in base-0 units.
    pub mass: u64,
    pub members_count: u64,
}
