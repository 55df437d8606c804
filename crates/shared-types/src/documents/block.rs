//! # Blocks
//!
//! A block links to its predecessor, carries web-of-trust changes and
//! transactions, and is sealed by its issuer's signature.
//!
//! ```text
//! inner_hash = sha256(inner text)
//! signed     = "InnerHash: {inner_hash}\nNonce: {nonce}\n"
//! hash       = sha256(signed + signature hex)
//! ```

use crate::documents::transaction::Transaction;
use crate::documents::wot::{Certification, Identity, Membership, Revocation};
use crate::entities::{sha256, to_hex, Blockstamp, Hash, PublicKey, Signature};
use crate::params::ConsensusParams;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A ledger block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub version: u32,
    pub currency: String,
    pub number: u64,
    pub pow_min: u32,
    pub time: u64,
    pub median_time: u64,
    pub members_count: u64,
    pub monetary_mass: u64,
    pub dividend: Option<u64>,
    pub unit_base: Option<u32>,
    pub issuer: PublicKey,
    pub previous_hash: Option<Hash>,
    pub previous_issuer: Option<PublicKey>,
    /// Present on the root block only.
    pub parameters: Option<ConsensusParams>,
    pub identities: Vec<Identity>,
    pub joiners: Vec<Membership>,
    pub actives: Vec<Membership>,
    pub leavers: Vec<Membership>,
    pub revoked: Vec<Revocation>,
    pub excluded: Vec<PublicKey>,
    pub certifications: Vec<Certification>,
    pub transactions: Vec<Transaction>,
    pub inner_hash: Hash,
    pub nonce: u64,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Block {
    pub fn is_root(&self) -> bool {
        self.number == 0
    }

    /// Canonical text covering every field but the seal.
    pub fn inner_text(&self) -> String {
        let mut raw = format!(
            "Version: {}\nType: Block\nCurrency: {}\nNumber: {}\nPoWMin: {}\nTime: {}\nMedianTime: {}\n",
            self.version, self.currency, self.number, self.pow_min, self.time, self.median_time
        );
        if let Some(dividend) = self.dividend {
            raw.push_str(&format!("UniversalDividend: {}\n", dividend));
        }
        if let Some(base) = self.unit_base {
            raw.push_str(&format!("UnitBase: {}\n", base));
        }
        raw.push_str(&format!("Issuer: {}\n", to_hex(&self.issuer)));
        if let Some(params) = &self.parameters {
            raw.push_str(&format!("Parameters: {}\n", params));
        }
        if let Some(previous) = &self.previous_hash {
            raw.push_str(&format!("PreviousHash: {}\n", to_hex(previous)));
        }
        if let Some(previous) = &self.previous_issuer {
            raw.push_str(&format!("PreviousIssuer: {}\n", to_hex(previous)));
        }
        raw.push_str(&format!(
            "MembersCount: {}\nMonetaryMass: {}\n",
            self.members_count, self.monetary_mass
        ));
        section(&mut raw, "Identities", self.identities.iter().map(Identity::compact));
        section(&mut raw, "Joiners", self.joiners.iter().map(Membership::compact));
        section(&mut raw, "Actives", self.actives.iter().map(Membership::compact));
        section(&mut raw, "Leavers", self.leavers.iter().map(Membership::compact));
        section(&mut raw, "Revoked", self.revoked.iter().map(Revocation::compact));
        section(&mut raw, "Excluded", self.excluded.iter().map(|key| to_hex(key)));
        section(
            &mut raw,
            "Certifications",
            self.certifications.iter().map(Certification::compact),
        );
        section(
            &mut raw,
            "Transactions",
            self.transactions.iter().map(|tx| to_hex(&tx.hash())),
        );
        raw
    }

    /// Hash of the inner text, as the block should declare it.
    pub fn compute_inner_hash(&self) -> Hash {
        sha256(self.inner_text().as_bytes())
    }

    /// Text signed by the block issuer.
    pub fn signing_payload(&self) -> String {
        format!(
            "InnerHash: {}\nNonce: {}\n",
            to_hex(&self.inner_hash),
            self.nonce
        )
    }

    /// Block hash, the target of the proof-of-work.
    pub fn hash(&self) -> Hash {
        let sealed = format!("{}{}\n", self.signing_payload(), to_hex(&self.signature));
        sha256(sealed.as_bytes())
    }

    pub fn blockstamp(&self) -> Blockstamp {
        Blockstamp::new(self.number, self.hash())
    }

    /// Every pubkey named in joiners, actives, leavers and excluded.
    pub fn membership_pubkeys(&self) -> impl Iterator<Item = &PublicKey> {
        self.joiners
            .iter()
            .chain(&self.actives)
            .chain(&self.leavers)
            .map(|ms| &ms.issuer)
            .chain(&self.excluded)
    }
}

fn section(raw: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    raw.push_str(title);
    raw.push_str(":\n");
    for line in lines {
        raw.push_str(&line);
        raw.push('\n');
    }
}

impl Default for Block {
    fn default() -> Self {
        Self {
            version: 10,
            currency: String::new(),
            number: 0,
            pow_min: 0,
            time: 0,
            median_time: 0,
            members_count: 0,
            monetary_mass: 0,
            dividend: None,
            unit_base: None,
            issuer: [0; 32],
            previous_hash: None,
            previous_issuer: None,
            parameters: None,
            identities: Vec::new(),
            joiners: Vec::new(),
            actives: Vec::new(),
            leavers: Vec::new(),
            revoked: Vec::new(),
            excluded: Vec::new(),
            certifications: Vec::new(),
            transactions: Vec::new(),
            inner_hash: [0; 32],
            nonce: 0,
            signature: [0; 64],
        }
    }
}
