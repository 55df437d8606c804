//! # Rule Engine (lc-01)
//!
//! Validation of blocks and transactions as ordered tables of named
//! predicates.
//!
//! ## Rule Tables
//!
//! | Table | Context | Suspends |
//! |-------|---------|----------|
//! | [`ALL_LOCAL`] | block, parameters, signature verifier | no |
//! | [`ALL_LOCAL_BUT_POW_AND_SIGNATURE`] | same, for block producers | no |
//! | [`ALL_GLOBAL`] | head block, `LedgerReader` | yes |
//!
//! ## Evaluation
//!
//! ```text
//! block ──► local_index ──► local rules (in order) ──► global rules (in order)
//!                                 │                          │
//!                                 └──── first failure ───────┴──► RuleViolation
//! ```
//!
//! A single pending transaction goes through the same per-transaction
//! checks via [`RuleEngine::check_local_transaction`] and
//! [`RuleEngine::check_global_transaction`].
//!
//! Failure messages are part of the observable contract: callers and
//! peers compare them verbatim.

pub mod context;
pub mod dividend;
pub mod engine;
pub mod global;
pub mod local;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{GlobalContext, RuleContext, TxContext};
pub use dividend::{dividend_due, expected_dividend, Dividend};
pub use engine::RuleEngine;
pub use global::{expected_median_time, global_rule, GlobalRule, SourceScope, ALL_GLOBAL};
pub use local::{
    local_alias, local_rule, LocalRule, ALL_LOCAL, ALL_LOCAL_BUT_POW_AND_SIGNATURE,
};
