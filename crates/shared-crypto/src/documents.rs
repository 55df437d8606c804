//! # Document Signing
//!
//! Helpers producing correctly signed documents. Used by issuers (and by
//! tests building fixtures); validation itself only ever verifies.

use crate::signatures::Ed25519KeyPair;
use shared_types::{Block, Certification, Identity, Membership, Revocation, Transaction};

/// Sign an identity with its own key.
pub fn sign_identity(keypair: &Ed25519KeyPair, identity: &mut Identity, currency: &str) {
    identity.issuer = keypair.public_key();
    identity.signature = keypair.sign(identity.signing_payload(currency).as_bytes());
}

/// Sign a membership with its issuer's key.
pub fn sign_membership(keypair: &Ed25519KeyPair, membership: &mut Membership, currency: &str) {
    membership.issuer = keypair.public_key();
    membership.signature = keypair.sign(membership.signing_payload(currency).as_bytes());
}

/// Sign a certification with the certifier's key.
pub fn sign_certification(keypair: &Ed25519KeyPair, cert: &mut Certification, currency: &str) {
    cert.issuer = keypair.public_key();
    cert.signature = keypair.sign(cert.signing_payload(currency).as_bytes());
}

/// Sign a revocation with the revoked identity's key.
pub fn sign_revocation(keypair: &Ed25519KeyPair, revocation: &mut Revocation, currency: &str) {
    revocation.pubkey = keypair.public_key();
    revocation.signature = keypair.sign(revocation.signing_payload(currency).as_bytes());
}

/// Replace the issuers and signatures of `tx`, one per key pair, in order.
pub fn sign_transaction(keypairs: &[&Ed25519KeyPair], tx: &mut Transaction) {
    tx.issuers = keypairs.iter().map(|kp| kp.public_key()).collect();
    let raw = tx.unsigned_raw();
    tx.signatures = keypairs.iter().map(|kp| kp.sign(raw.as_bytes())).collect();
}

/// Set issuer and inner hash, then sign the block.
pub fn seal_block(keypair: &Ed25519KeyPair, block: &mut Block) {
    block.issuer = keypair.public_key();
    block.inner_hash = block.compute_inner_hash();
    block.signature = keypair.sign(block.signing_payload().as_bytes());
}
