//! Ledger documents: blocks, transactions and web-of-trust documents.

pub mod block;
pub mod transaction;
pub mod wot;

pub use block::Block;
pub use transaction::{
    parse_conditions, Condition, SourceId, Transaction, TxInput, TxOutput, TxUnlock, UnlockProof,
    TRANSACTION_VERSION,
};
pub use wot::{Certification, Identity, Membership, MembershipKind, Revocation};
