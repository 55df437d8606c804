//! # Transactions
//!
//! A transaction consumes sources (dividends or earlier outputs) and creates
//! new outputs locked by spending conditions.
//!
//! ## Identity
//!
//! The transaction hash is the SHA-256 of the *signed* raw text. Every issuer
//! signs the *unsigned* raw text, in issuer order.
//!
//! ## Output Conditions
//!
//! | Term | Satisfied when |
//! |------|----------------|
//! | `SIG(pubkey)` | an unlock proof `SIG(i)` points at an issuer with that key |
//! | `XHX(hash)` | an unlock proof `XHX(password)` hashes to `hash` |
//! | `CLTV(time)` | the chain median time reached `time` |
//! | `CSV(delay)` | `delay` seconds elapsed since the source was written |
//!
//! Terms are combined with `&&`.

use crate::entities::{parse_hex32, sha256, to_hex, Blockstamp, Hash, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// The only transaction version this core accepts.
pub const TRANSACTION_VERSION: u32 = 10;

/// Identifies a spendable source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceId {
    /// Universal dividend created for `issuer` by block `block_number`.
    Dividend { issuer: PublicKey, block_number: u64 },
    /// Output `output_index` of transaction `tx_hash`.
    Utxo { tx_hash: Hash, output_index: u32 },
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Dividend {
                issuer,
                block_number,
            } => write!(f, "D:{}:{}", to_hex(issuer), block_number),
            SourceId::Utxo {
                tx_hash,
                output_index,
            } => write!(f, "T:{}:{}", to_hex(tx_hash), output_index),
        }
    }
}

/// A source consumed by a transaction, with its claimed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub amount: u64,
    pub base: u32,
    pub source: SourceId,
}

impl fmt::Display for TxInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.amount, self.base, self.source)
    }
}

/// Proof provided to satisfy one term of an output condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockProof {
    /// Signature of the issuer at this index.
    Sig(usize),
    /// Password revealing a hash lock.
    Xhx(String),
}

impl fmt::Display for UnlockProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockProof::Sig(index) => write!(f, "SIG({})", index),
            UnlockProof::Xhx(password) => write!(f, "XHX({})", password),
        }
    }
}

/// Proofs unlocking the input at `input_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxUnlock {
    pub input_index: usize,
    pub proofs: Vec<UnlockProof>,
}

impl fmt::Display for TxUnlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proofs: Vec<String> = self.proofs.iter().map(ToString::to_string).collect();
        write!(f, "{}:{}", self.input_index, proofs.join(" "))
    }
}

/// An output created by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: u64,
    pub base: u32,
    /// Spending conditions, e.g. `SIG(<pubkey hex>)`.
    pub conditions: String,
}

impl TxOutput {
    /// Parse the spending conditions. `None` when the expression is malformed.
    pub fn parsed_conditions(&self) -> Option<Vec<Condition>> {
        parse_conditions(&self.conditions)
    }
}

impl fmt::Display for TxOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.amount, self.base, self.conditions)
    }
}

/// One term of an output's spending conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Sig(PublicKey),
    Xhx(Hash),
    Cltv(u64),
    Csv(u64),
}

/// Parse a `&&`-joined condition expression.
pub fn parse_conditions(text: &str) -> Option<Vec<Condition>> {
    if text.trim().is_empty() {
        return None;
    }
    text.split("&&").map(|term| parse_term(term.trim())).collect()
}

fn parse_term(term: &str) -> Option<Condition> {
    let (name, rest) = term.split_once('(')?;
    let arg = rest.strip_suffix(')')?;
    match name {
        "SIG" => parse_hex32(arg).map(Condition::Sig),
        "XHX" => parse_hex32(arg).map(Condition::Xhx),
        "CLTV" => arg.parse().ok().map(Condition::Cltv),
        "CSV" => arg.parse().ok().map(Condition::Csv),
        _ => None,
    }
}

/// A value transfer document.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub currency: String,
    /// Chain point anchoring the transaction's validity window.
    pub blockstamp: Blockstamp,
    pub locktime: u64,
    pub issuers: Vec<PublicKey>,
    pub inputs: Vec<TxInput>,
    pub unlocks: Vec<TxUnlock>,
    pub outputs: Vec<TxOutput>,
    pub comment: String,
    #[serde_as(as = "Vec<Bytes>")]
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Canonical text signed by every issuer.
    pub fn unsigned_raw(&self) -> String {
        let mut raw = format!(
            "Version: {}\nType: Transaction\nCurrency: {}\nBlockstamp: {}\nLocktime: {}\nIssuers:\n",
            self.version, self.currency, self.blockstamp, self.locktime
        );
        for issuer in &self.issuers {
            raw.push_str(&to_hex(issuer));
            raw.push('\n');
        }
        raw.push_str("Inputs:\n");
        for input in &self.inputs {
            raw.push_str(&format!("{}\n", input));
        }
        raw.push_str("Unlocks:\n");
        for unlock in &self.unlocks {
            raw.push_str(&format!("{}\n", unlock));
        }
        raw.push_str("Outputs:\n");
        for output in &self.outputs {
            raw.push_str(&format!("{}\n", output));
        }
        raw.push_str(&format!("Comment: {}\n", self.comment));
        raw
    }

    /// Unsigned raw text followed by one signature per line.
    pub fn signed_raw(&self) -> String {
        let mut raw = self.unsigned_raw();
        for signature in &self.signatures {
            raw.push_str(&to_hex(signature));
            raw.push('\n');
        }
        raw
    }

    /// Content hash identifying the transaction.
    pub fn hash(&self) -> Hash {
        sha256(self.signed_raw().as_bytes())
    }

    /// Number of lines of the compact block rendering.
    pub fn compact_line_count(&self) -> usize {
        let comment = usize::from(!self.comment.is_empty());
        2 + self.issuers.len()
            + self.inputs.len()
            + self.unlocks.len()
            + self.outputs.len()
            + comment
            + self.signatures.len()
    }
}
