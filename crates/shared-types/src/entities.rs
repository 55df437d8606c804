//! # Core Ledger Primitives
//!
//! Fixed-size identifiers shared by every document and every crate of the
//! workspace, plus the canonical hashing function.
//!
//! ## Conventions
//!
//! - Hashes are SHA-256 digests of canonical document text.
//! - Public keys are raw 32-byte Ed25519 keys.
//! - Both render as uppercase hex in canonical text and logs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Hash arbitrary bytes with SHA-256.
pub fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Uppercase hex rendering used in canonical document text.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Short form for log fields: first four bytes of a hash or key.
pub fn short(bytes: &[u8]) -> String {
    hex::encode_upper(&bytes[..bytes.len().min(4)])
}

/// Parse a 32-byte value (hash or public key) from hex.
pub fn parse_hex32(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

/// A reference to a specific chain point: block number and block hash.
///
/// Transactions anchor their validity window to a blockstamp; identities and
/// memberships use it to record when they were created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Blockstamp {
    /// Block number (height).
    pub number: u64,
    /// Hash of the block at that height.
    pub hash: Hash,
}

impl Blockstamp {
    /// Create a blockstamp.
    pub fn new(number: u64, hash: Hash) -> Self {
        Self { number, hash }
    }
}

impl fmt::Display for Blockstamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, to_hex(&self.hash))
    }
}

/// Error returned when a blockstamp string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid blockstamp: {0}")]
pub struct BlockstampParseError(pub String);

impl FromStr for Blockstamp {
    type Err = BlockstampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, hash) = s
            .split_once('-')
            .ok_or_else(|| BlockstampParseError(s.to_string()))?;
        let number = number
            .parse()
            .map_err(|_| BlockstampParseError(s.to_string()))?;
        let hash = parse_hex32(hash).ok_or_else(|| BlockstampParseError(s.to_string()))?;
        Ok(Self { number, hash })
    }
}

/// Convert an amount at a given unit base into base-0 units.
///
/// Returns `None` when the result does not fit.
pub fn amount_in_base_units(amount: u64, base: u32) -> Option<i128> {
    10i128
        .checked_pow(base)
        .and_then(|factor| factor.checked_mul(i128::from(amount)))
}
