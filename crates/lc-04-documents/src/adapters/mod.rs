//! Adapters implementing the outbound ports in process memory.

pub mod memory;
pub mod sandbox;

pub use memory::InMemoryLedger;
pub use sandbox::{TransactionSandbox, DEFAULT_SANDBOX_CAPACITY};
