//! Guarantees that must hold for any input.

pub mod commit;
pub mod ledger;
