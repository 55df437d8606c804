//! # Node Runtime Library
//!
//! Configuration and wiring of the ledger core, exposed for the binary and
//! for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, JSON file, `LC_*` environment)
//! 2. Initialize logging from `log_filter`
//! 3. Build ledger, pool, event bus and document services
//! 4. Start the pending-transaction feed
//! 5. Run until Ctrl+C

pub mod config;
pub mod runtime;

pub use config::{ConfigError, NodeConfig};
pub use runtime::NodeRuntime;
