//! Global transaction rules: anchoring, history and source availability.

use super::{reject, GlobalResult};
use crate::context::TxContext;
use crate::local::check_transaction_locally;
use shared_types::{
    parse_conditions, sha256, Condition, SourceId, SourceRecord, Transaction, UnlockProof,
};
use std::collections::{HashMap, HashSet};

/// Sources created by transactions evaluated earlier in the same block.
#[derive(Debug, Default, Clone)]
pub struct SourceScope {
    created: HashMap<SourceId, SourceRecord>,
}

impl SourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the outputs of `tx` spendable by later transactions.
    pub fn record_outputs(&mut self, tx: &Transaction, written_time: u64) {
        let tx_hash = tx.hash();
        for (index, output) in tx.outputs.iter().enumerate() {
            let id = SourceId::Utxo {
                tx_hash,
                output_index: index as u32,
            };
            self.created.insert(
                id,
                SourceRecord {
                    id,
                    amount: output.amount,
                    base: output.base,
                    conditions: output.conditions.clone(),
                    consumed: false,
                    written_time,
                },
            );
        }
    }

    pub fn get(&self, id: &SourceId) -> Option<&SourceRecord> {
        self.created.get(id)
    }
}

/// The blockstamp names a known block, recent enough for the context time.
pub async fn check_tx_blockstamp(tx: &Transaction, ctx: &TxContext<'_>) -> GlobalResult {
    const RULE: &str = "check_tx_blockstamp";
    let anchor = ctx
        .reader
        .block_at(tx.blockstamp.number)
        .await?
        .filter(|block| block.hash() == tx.blockstamp.hash);
    let Some(anchor) = anchor else {
        return reject(RULE, "Wrong blockstamp for transaction");
    };
    if anchor.median_time.saturating_add(ctx.params.tx_window) < ctx.median_time {
        return reject(RULE, "Transaction has expired");
    }
    Ok(())
}

/// The transaction belongs to the currency of the chain's root block.
pub async fn check_tx_currency(tx: &Transaction, ctx: &TxContext<'_>) -> GlobalResult {
    match ctx.reader.block_at(0).await? {
        Some(root) if root.currency != tx.currency => {
            reject("check_tx_currency", "Wrong currency")
        }
        _ => Ok(()),
    }
}

/// Every unlock names a distinct input of the transaction.
fn check_unlock_indexes(tx: &Transaction) -> GlobalResult {
    let mut seen = HashSet::new();
    for unlock in &tx.unlocks {
        if unlock.input_index >= tx.inputs.len() || !seen.insert(unlock.input_index) {
            return reject("check_single_transaction", "Unlock conditions are not satisfied");
        }
    }
    Ok(())
}

/// Full contextual check of one transaction: local rules, currency,
/// blockstamp, locktime, history, then every consumed source.
pub async fn check_single_transaction(
    tx: &Transaction,
    ctx: &TxContext<'_>,
    scope: &SourceScope,
) -> GlobalResult {
    const RULE: &str = "check_single_transaction";
    check_transaction_locally(tx, &ctx.local())?;
    check_tx_currency(tx, ctx).await?;
    check_tx_blockstamp(tx, ctx).await?;
    if tx.locktime > ctx.median_time {
        return reject(RULE, "Transaction is locked");
    }

    if let Some(record) = ctx.reader.transaction_by_hash(&tx.hash()).await? {
        if record.is_written() {
            return reject(RULE, "Transaction already processed");
        }
    }

    check_unlock_indexes(tx)?;
    for (index, input) in tx.inputs.iter().enumerate() {
        let source = match scope.get(&input.source) {
            Some(source) => source.clone(),
            None => match ctx.reader.source(&input.source).await? {
                Some(source) => source,
                None => return reject(RULE, "Source does not exist"),
            },
        };
        if source.consumed {
            return reject(RULE, "Source already consumed");
        }
        if source.amount != input.amount || source.base != input.base {
            return reject(RULE, "Source amount does not match");
        }
        check_unlock(tx, index, &source, ctx.median_time)?;
    }
    Ok(())
}

fn check_unlock(
    tx: &Transaction,
    input_index: usize,
    source: &SourceRecord,
    median_time: u64,
) -> GlobalResult {
    const RULE: &str = "check_single_transaction";
    const UNSATISFIED: &str = "Unlock conditions are not satisfied";

    let Some(conditions) = parse_conditions(&source.conditions) else {
        return reject(RULE, UNSATISFIED);
    };
    let Some(unlock) = tx.unlocks.iter().find(|u| u.input_index == input_index) else {
        return reject(RULE, UNSATISFIED);
    };

    for condition in conditions {
        let satisfied = match condition {
            Condition::Sig(key) => unlock.proofs.iter().any(|proof| {
                matches!(proof, UnlockProof::Sig(i) if tx.issuers.get(*i) == Some(&key))
            }),
            Condition::Xhx(hash) => unlock.proofs.iter().any(|proof| {
                matches!(proof, UnlockProof::Xhx(password) if sha256(password.as_bytes()) == hash)
            }),
            Condition::Cltv(time) => {
                if median_time < time {
                    return reject(RULE, "Source is locked");
                }
                true
            }
            Condition::Csv(delay) => {
                if median_time < source.written_time.saturating_add(delay) {
                    return reject(RULE, "Source is locked");
                }
                true
            }
        };
        if !satisfied {
            return reject(RULE, UNSATISFIED);
        }
    }
    Ok(())
}
