//! Web-of-trust documents carried inside blocks.
//!
//! Each document signs a canonical payload that embeds the currency name,
//! so a signature issued for one currency never verifies on another.

use crate::entities::{to_hex, Blockstamp, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// A self-declared identity: a public key claiming a unique user id.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub issuer: PublicKey,
    pub uid: String,
    /// Chain point the identity was created against.
    pub created_on: Blockstamp,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Identity {
    /// Canonical text signed by the identity's issuer.
    pub fn signing_payload(&self, currency: &str) -> String {
        format!(
            "Version: 10\nType: Identity\nCurrency: {}\nIssuer: {}\nUniqueID: {}\nTimestamp: {}\n",
            currency,
            to_hex(&self.issuer),
            self.uid,
            self.created_on
        )
    }

    /// Single-line rendering used in a block's inner text.
    pub fn compact(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            to_hex(&self.issuer),
            to_hex(&self.signature),
            self.created_on,
            self.uid
        )
    }
}

/// Direction of a membership document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipKind {
    /// Join or renew.
    In,
    /// Leave.
    Out,
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipKind::In => f.write_str("IN"),
            MembershipKind::Out => f.write_str("OUT"),
        }
    }
}

/// A membership request. Joiners and actives carry `In`, leavers carry `Out`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub issuer: PublicKey,
    pub kind: MembershipKind,
    pub uid: String,
    /// Chain point the membership was signed against.
    pub created_on: Blockstamp,
    /// Creation blockstamp of the identity this membership refers to.
    pub identity_created_on: Blockstamp,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Membership {
    pub fn signing_payload(&self, currency: &str) -> String {
        format!(
            "Version: 10\nType: Membership\nCurrency: {}\nIssuer: {}\nBlock: {}\nMembership: {}\nUserID: {}\nCertTS: {}\n",
            currency,
            to_hex(&self.issuer),
            self.created_on,
            self.kind,
            self.uid,
            self.identity_created_on
        )
    }

    pub fn compact(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            to_hex(&self.issuer),
            to_hex(&self.signature),
            self.created_on,
            self.identity_created_on,
            self.uid
        )
    }
}

/// A certification of `receiver` by `issuer`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub issuer: PublicKey,
    pub receiver: PublicKey,
    /// Block number the certification was signed against.
    pub block_number: u64,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Certification {
    pub fn signing_payload(&self, currency: &str) -> String {
        format!(
            "Version: 10\nType: Certification\nCurrency: {}\nIssuer: {}\nIdtyIssuer: {}\nCertBlock: {}\n",
            currency,
            to_hex(&self.issuer),
            to_hex(&self.receiver),
            self.block_number
        )
    }

    pub fn compact(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            to_hex(&self.issuer),
            to_hex(&self.receiver),
            self.block_number,
            to_hex(&self.signature)
        )
    }
}

/// Revocation of an identity, signed by the identity's own key.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub pubkey: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Revocation {
    pub fn signing_payload(&self, currency: &str) -> String {
        format!(
            "Version: 10\nType: Revocation\nCurrency: {}\nIssuer: {}\n",
            currency,
            to_hex(&self.pubkey)
        )
    }

    pub fn compact(&self) -> String {
        format!("{}:{}", to_hex(&self.pubkey), to_hex(&self.signature))
    }
}
