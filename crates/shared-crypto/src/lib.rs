//! # Shared Crypto - Document Signatures
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Key pairs, `SignatureVerifier` adapter |
//! | `documents` | Ed25519 over canonical text | Signing and sealing documents |
//!
//! Hashing (SHA-256) lives in `shared-types`, next to the canonical text
//! it digests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod documents;
pub mod errors;
pub mod signatures;

// Re-exports
pub use documents::{
    seal_block, sign_certification, sign_identity, sign_membership, sign_revocation,
    sign_transaction,
};
pub use errors::CryptoError;
pub use signatures::{verify_signature, Ed25519KeyPair, Ed25519Verifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
