//! # Indexer (lc-02)
//!
//! Computes the ordered list of state transitions a block implies. The
//! persistence layer applies the list; this crate never mutates state.
//!
//! ## Operations
//!
//! | Operation | Input | Consults state |
//! |-----------|-------|----------------|
//! | [`local_index`] | block, consensus parameters | no |
//! | [`global_index`] | block, consensus parameters, `LedgerReader` | yes, read-only |
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Deterministic ordering | entries sorted by (category, position), stable |
//! | Same `(block, state)` gives the same entries | no clocks, no randomness, sorted member sets |
//! | No partial application | entries are a description only |
//!
//! Category order is identity, membership, certification, source. The
//! position is the ordinal of the triggering sub-document, counted in block
//! order: identities, joiners, actives, leavers, revoked, excluded,
//! certifications, then each transaction's inputs and outputs.

pub mod domain;
pub mod global;

pub use domain::entries::{sort_entries, IndexCategory, IndexEntry, IndexKind, IndexOp};
pub use domain::local::local_index;
pub use global::{global_index, members_after};
