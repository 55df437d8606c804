//! # Ed25519 Signatures
//!
//! Key pairs for document issuers and the verifier plugged into rule
//! evaluation.
//!
//! ## Security Properties
//!
//! - No RNG dependency when signing (deterministic nonce from message)
//! - Seeds are zeroized when a key pair is dropped
//! - Malformed public keys never verify

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use shared_types::{PublicKey, Signature, SignatureVerifier};
use zeroize::Zeroize;

/// Ed25519 keypair.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        Self { signing_key }
    }

    /// Create from a hex-encoded 32-byte seed.
    pub fn from_hex_seed(hex_seed: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(hex_seed.trim())
            .map_err(|e| CryptoError::InvalidSeed(e.to_string()))?;
        let seed: Result<[u8; 32], _> = bytes.as_slice().try_into();
        bytes.zeroize();
        let mut seed = seed.map_err(|_| CryptoError::InvalidSeed("expected 32 bytes".into()))?;
        let keypair = Self::from_seed(seed);
        seed.zeroize();
        Ok(keypair)
    }

    /// Get public key.
    pub fn public_key(&self) -> PublicKey {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message (deterministic - no RNG needed).
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

/// Verify `signature` over `message` with `key`.
pub fn verify_signature(
    signature: &Signature,
    message: &[u8],
    key: &PublicKey,
) -> Result<(), CryptoError> {
    let verifying_key = VerifyingKey::from_bytes(key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    verifying_key
        .verify(message, &sig)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// `SignatureVerifier` backed by ed25519-dalek.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, signature: &Signature, message: &[u8], key: &PublicKey) -> bool {
        verify_signature(signature, message, key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = Ed25519KeyPair::generate();
        let message = b"Hello, Ed25519!";

        let signature = keypair.sign(message);
        assert!(Ed25519Verifier.verify(&signature, message, &keypair.public_key()));
    }

    #[test]
    fn test_wrong_message_fails() {
        let keypair = Ed25519KeyPair::generate();

        let signature = keypair.sign(b"message1");
        let result = verify_signature(&signature, b"message2", &keypair.public_key());

        assert!(matches!(result, Err(CryptoError::SignatureVerificationFailed)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let keypair1 = Ed25519KeyPair::generate();
        let keypair2 = Ed25519KeyPair::generate();
        let message = b"test";

        let signature = keypair1.sign(message);
        assert!(!Ed25519Verifier.verify(&signature, message, &keypair2.public_key()));
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = Ed25519KeyPair::from_seed([0xAB; 32]);
        let message = b"deterministic test";

        assert_eq!(keypair.sign(message), keypair.sign(message));
    }

    #[test]
    fn test_hex_seed() {
        let from_bytes = Ed25519KeyPair::from_seed([0x11; 32]);
        let from_hex = Ed25519KeyPair::from_hex_seed(&"11".repeat(32)).unwrap();
        assert_eq!(from_bytes.public_key(), from_hex.public_key());

        assert!(Ed25519KeyPair::from_hex_seed("zz").is_err());
        assert!(Ed25519KeyPair::from_hex_seed("1111").is_err());
    }
}
