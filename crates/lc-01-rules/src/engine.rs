//! Rule evaluation entry points.
//!
//! Rules run in table order and evaluation stops at the first failure; the
//! reported violation is always the earliest failing rule.

use crate::context::{GlobalContext, RuleContext, TxContext};
use crate::global::{check_single_transaction, GlobalRule, SourceScope};
use crate::local::{check_transaction_locally, LocalRule};
use lc_02_indexer::local_index;
use shared_types::{Block, LedgerError, RuleViolation, Transaction};
use tracing::{debug, trace};

/// Stateless rule runner.
pub struct RuleEngine;

impl RuleEngine {
    /// Evaluate `rules` against `block` alone. The block's local index is
    /// computed once and shared by every rule.
    pub fn check_local(
        rules: &[LocalRule],
        block: &Block,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleViolation> {
        let index = local_index(block, ctx.params);
        for rule in rules {
            trace!(rule = rule.name, number = block.number, "Evaluating local rule");
            if let Err(violation) = (rule.check)(block, ctx, &index) {
                debug!(
                    rule = rule.name,
                    number = block.number,
                    reason = %violation.message,
                    "Local rule failed"
                );
                return Err(violation);
            }
        }
        Ok(())
    }

    /// Evaluate `rules` against `block` and the persisted state.
    pub async fn check_global(
        rules: &[GlobalRule],
        block: &Block,
        ctx: &GlobalContext<'_>,
    ) -> Result<(), LedgerError> {
        for rule in rules {
            trace!(rule = rule.name(), number = block.number, "Evaluating global rule");
            if let Err(err) = rule.check(block, ctx).await {
                debug!(
                    rule = rule.name(),
                    number = block.number,
                    error = %err,
                    "Global rule failed"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Local checks of a single pending transaction.
    pub fn check_local_transaction(
        tx: &Transaction,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleViolation> {
        check_transaction_locally(tx, ctx)
    }

    /// Full check of a single pending transaction against the persisted
    /// state, outside of any block.
    pub async fn check_global_transaction(
        tx: &Transaction,
        ctx: &TxContext<'_>,
    ) -> Result<(), LedgerError> {
        check_single_transaction(tx, ctx, &SourceScope::new()).await
    }
}
