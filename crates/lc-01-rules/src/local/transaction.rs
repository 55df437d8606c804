//! Local rules on the transactions a block carries.
//!
//! Every block rule here is the per-transaction check applied to each
//! transaction in order; [`check_transaction_locally`] applies the same
//! checks to a single pending transaction.

use super::{fail, RuleResult};
use crate::context::RuleContext;
use lc_02_indexer::IndexEntry;
use shared_types::{
    amount_in_base_units, Block, Hash, RuleViolation, SourceId, Transaction, TRANSACTION_VERSION,
};
use std::collections::{HashMap, HashSet};

/// Maximum compact line count of a transaction.
pub const MAX_TX_LINES: usize = 100;
/// Maximum length of one output or unlock line.
pub const MAX_TX_FIELD_CHARS: usize = 2000;
/// Maximum depth of transactions spending outputs of the same block.
pub const MAX_TX_CHAINING_DEPTH: usize = 5;

fn tx_version(tx: &Transaction) -> RuleResult {
    if tx.version != TRANSACTION_VERSION {
        return fail("check_tx_version", "A transaction must have the version 10");
    }
    Ok(())
}

fn tx_len(tx: &Transaction) -> RuleResult {
    const RULE: &str = "check_tx_len";
    if tx.compact_line_count() > MAX_TX_LINES {
        return fail(RULE, "A transaction has a maximum size of 100 lines");
    }
    if tx
        .outputs
        .iter()
        .any(|output| output.to_string().len() > MAX_TX_FIELD_CHARS)
    {
        return fail(RULE, "A transaction output has a maximum size of 2000 characters");
    }
    if tx
        .unlocks
        .iter()
        .any(|unlock| unlock.to_string().len() > MAX_TX_FIELD_CHARS)
    {
        return fail(RULE, "A transaction unlock has a maximum size of 2000 characters");
    }
    Ok(())
}

fn tx_issuers(tx: &Transaction) -> RuleResult {
    if tx.issuers.is_empty() {
        return fail("check_tx_issuers", "A transaction must have at least 1 issuer");
    }
    Ok(())
}

fn tx_has_sources(tx: &Transaction) -> RuleResult {
    if tx.inputs.is_empty() {
        return fail("check_tx_sources", "A transaction must have at least 1 source");
    }
    Ok(())
}

fn duplicated_source() -> RuleResult {
    fail(
        "check_tx_sources",
        "It cannot exist 2 identical sources for transactions inside a given block",
    )
}

fn tx_recipients(tx: &Transaction) -> RuleResult {
    const RULE: &str = "check_tx_recipients";
    if tx.outputs.is_empty() {
        return fail(RULE, "A transaction must have at least 1 recipient");
    }
    if tx.outputs.iter().any(|output| output.conditions.trim().is_empty()) {
        return fail(RULE, "Empty conditions are forbidden");
    }
    if tx.outputs.iter().any(|output| output.parsed_conditions().is_none()) {
        return fail(RULE, "Wrong output format");
    }
    Ok(())
}

/// Money conservation, then unit base transformation.
///
/// Outputs at a base may only exceed inputs at that base by what lower
/// bases gave up: for each base `i` from the lowest used up to the highest
/// output base, `delta_i * 10^i` must not exceed `-sum(delta_j * 10^j)` over
/// the lower bases `j`.
fn tx_amounts(tx: &Transaction) -> RuleResult {
    const RULE: &str = "check_tx_amounts";
    const UNBALANCED: &str = "Transaction inputs sum must equal outputs sum";
    const BAD_BASE: &str = "Transaction output base amount does not equal previous base deltas";

    let inputs: Vec<(u64, u32)> = tx.inputs.iter().map(|i| (i.amount, i.base)).collect();
    let outputs: Vec<(u64, u32)> = tx.outputs.iter().map(|o| (o.amount, o.base)).collect();

    let (Some(input_sum), Some(output_sum)) = (base_units_sum(&inputs), base_units_sum(&outputs))
    else {
        return fail(RULE, UNBALANCED);
    };
    if input_sum != output_sum {
        return fail(RULE, UNBALANCED);
    }

    let Some(common_base) = inputs.iter().chain(&outputs).map(|(_, base)| *base).min() else {
        return Ok(());
    };
    let max_output_base = outputs.iter().map(|(_, base)| *base).max().unwrap_or(common_base);

    let per_base = |items: &[(u64, u32)], base: u32| -> i128 {
        items
            .iter()
            .filter(|(_, b)| *b == base)
            .map(|(amount, _)| i128::from(*amount))
            .sum()
    };

    // Base-0 value given up by the bases below the current one
    let mut released: i128 = 0;
    for base in common_base..=max_output_base {
        let delta = per_base(&outputs, base) - per_base(&inputs, base);
        let Some(scale) = 10i128.checked_pow(base) else {
            return fail(RULE, BAD_BASE);
        };
        let Some(value) = delta.checked_mul(scale) else {
            return fail(RULE, BAD_BASE);
        };
        if delta > 0 && value > released {
            return fail(RULE, BAD_BASE);
        }
        released -= value;
    }
    Ok(())
}

fn base_units_sum(items: &[(u64, u32)]) -> Option<i128> {
    items.iter().try_fold(0i128, |acc, (amount, base)| {
        acc.checked_add(amount_in_base_units(*amount, *base)?)
    })
}

fn tx_signature(tx: &Transaction, ctx: &RuleContext<'_>) -> RuleResult {
    const RULE: &str = "check_tx_signature";
    if tx.signatures.len() != tx.issuers.len() {
        return fail(RULE, "Signature from a transaction must match");
    }
    let raw = tx.unsigned_raw();
    let all_valid = tx
        .issuers
        .iter()
        .zip(&tx.signatures)
        .all(|(issuer, signature)| ctx.verifier.verify(signature, raw.as_bytes(), issuer));
    if !all_valid {
        return fail(RULE, "Signature from a transaction must match");
    }
    Ok(())
}

/// Run `check` on every transaction of the block, stopping at the first failure.
fn each_tx(block: &Block, check: impl Fn(&Transaction) -> RuleResult) -> RuleResult {
    block.transactions.iter().try_for_each(check)
}

pub fn check_tx_version(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    each_tx(block, tx_version)
}

pub fn check_tx_len(block: &Block, _ctx: &RuleContext<'_>, _index: &[IndexEntry]) -> RuleResult {
    each_tx(block, tx_len)
}

pub fn check_tx_issuers(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    each_tx(block, tx_issuers)
}

/// Every transaction has a source, and no source is spent twice within
/// the block.
pub fn check_tx_sources(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    each_tx(block, tx_has_sources)?;
    let mut seen: HashSet<SourceId> = HashSet::new();
    for tx in &block.transactions {
        for input in &tx.inputs {
            if !seen.insert(input.source) {
                return duplicated_source();
            }
        }
    }
    Ok(())
}

pub fn check_tx_recipients(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    each_tx(block, tx_recipients)
}

pub fn check_tx_amounts(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    each_tx(block, tx_amounts)
}

pub fn check_tx_signature(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    each_tx(block, |tx| tx_signature(tx, ctx))
}

/// A transaction spending no output of the block has depth 0; one spending
/// an output of a depth-`n` transaction of the block has depth `n + 1`.
pub fn check_tx_chaining_depth(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    let mut depths: HashMap<Hash, usize> = HashMap::new();
    for tx in &block.transactions {
        let depth = tx
            .inputs
            .iter()
            .filter_map(|input| match input.source {
                SourceId::Utxo { tx_hash, .. } => depths.get(&tx_hash).map(|d| d + 1),
                SourceId::Dividend { .. } => None,
            })
            .max()
            .unwrap_or(0);
        if depth > MAX_TX_CHAINING_DEPTH {
            return fail(
                "check_tx_chaining_depth",
                "The maximum transaction chaining length per block is 5",
            );
        }
        depths.insert(tx.hash(), depth);
    }
    Ok(())
}

/// Structural, amount and signature checks of a single transaction, in the
/// same order as the block rules.
pub fn check_transaction_locally(
    tx: &Transaction,
    ctx: &RuleContext<'_>,
) -> Result<(), RuleViolation> {
    tx_version(tx)?;
    tx_len(tx)?;
    tx_issuers(tx)?;
    tx_has_sources(tx)?;
    let mut seen = HashSet::new();
    if tx.inputs.iter().any(|input| !seen.insert(input.source)) {
        return duplicated_source();
    }
    tx_recipients(tx)?;
    tx_amounts(tx)?;
    tx_signature(tx, ctx)
}
