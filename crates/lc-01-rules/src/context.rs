//! Read-only bundles handed to rules. Built per validation call, never
//! mutated.

use shared_types::{Block, ConsensusParams, LedgerReader, SignatureVerifier};

/// Context of local rules: parameters and signature verification only.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub params: &'a ConsensusParams,
    pub verifier: &'a dyn SignatureVerifier,
}

/// Context of global block rules.
#[derive(Clone, Copy)]
pub struct GlobalContext<'a> {
    pub params: &'a ConsensusParams,
    /// Current chain head; `None` before the root block.
    pub head: Option<&'a Block>,
    pub reader: &'a dyn LedgerReader,
    pub verifier: &'a dyn SignatureVerifier,
}

impl<'a> GlobalContext<'a> {
    pub fn local(&self) -> RuleContext<'a> {
        RuleContext {
            params: self.params,
            verifier: self.verifier,
        }
    }

    /// Transaction context evaluated at `median_time`.
    pub fn at(&self, median_time: u64) -> TxContext<'a> {
        TxContext {
            params: self.params,
            reader: self.reader,
            verifier: self.verifier,
            median_time,
        }
    }
}

/// Context of global transaction rules.
#[derive(Clone, Copy)]
pub struct TxContext<'a> {
    pub params: &'a ConsensusParams,
    pub reader: &'a dyn LedgerReader,
    pub verifier: &'a dyn SignatureVerifier,
    /// Chain time the transaction is evaluated at.
    pub median_time: u64,
}

impl<'a> TxContext<'a> {
    pub fn local(&self) -> RuleContext<'a> {
        RuleContext {
            params: self.params,
            verifier: self.verifier,
        }
    }
}
