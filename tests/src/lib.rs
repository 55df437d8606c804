//! # Ledger-Core Test Suite
//!
//! Cross-crate tests driving the document services end to end.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/      # Whole flows over the in-memory node
//! │   ├── flows.rs
//! │   └── scenarios.rs
//! │
//! └── properties/       # Guarantees that must hold for any input
//!     ├── commit.rs     # idempotence, ordering, pool capacity
//!     └── ledger.rs     # balance, identity uniqueness
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lc-tests
//! cargo test -p lc-tests integration::
//! cargo test -p lc-tests properties::
//! ```

pub mod integration;
pub mod properties;
