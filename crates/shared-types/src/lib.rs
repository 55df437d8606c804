//! # Shared Types Crate
//!
//! Ledger documents, consensus parameters, state read models, the shared
//! error taxonomy and the ports every validating crate consumes.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every cross-crate type is defined here.
//! - **Canonical Text**: Hashes and signatures are computed over the
//!   documents' canonical text renderings, never over serialized structs.
//! - **Read-Only Context**: Validation only ever receives `LedgerReader`;
//!   writing is a capability of the document services alone.

pub mod documents;
pub mod entities;
pub mod errors;
pub mod params;
pub mod ports;
pub mod records;

pub use documents::*;
pub use entities::*;
pub use errors::*;
pub use params::ConsensusParams;
pub use ports::{LedgerReader, SignatureVerifier};
pub use records::*;
