//! Global rules on a candidate block, evaluated against the chain head and
//! the persisted state.

use super::transaction::{check_single_transaction, SourceScope};
use super::{reject, GlobalResult};
use crate::context::GlobalContext;
use crate::dividend::{dividend_due, expected_dividend};
use crate::local::block::certifications_received;
use shared_types::{
    amount_in_base_units, Block, ConsensusParams, LedgerError, LedgerReader, PublicKey,
    StorageError,
};
use std::collections::HashSet;

pub async fn check_number(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    const RULE: &str = "check_number";
    match ctx.head {
        None if block.number != 0 => reject(RULE, "Root block must have number 0"),
        Some(head) if block.number != head.number + 1 => {
            reject(RULE, "Block number must follow current block")
        }
        _ => Ok(()),
    }
}

/// The declared difficulty may not undercut the chain's minimum. A root
/// block answers to the parameters it carries.
pub async fn check_pow_min(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    let required = match (ctx.head, &block.parameters) {
        (None, Some(own)) => own.pow_min,
        _ => ctx.params.pow_min,
    };
    if block.pow_min < required {
        return reject(
            "check_pow_min",
            "Block pow_min is below the chain's minimum difficulty",
        );
    }
    Ok(())
}

pub async fn check_currency(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    match ctx.head {
        Some(head) if block.currency != head.currency => {
            reject("check_currency", "Wrong currency")
        }
        _ => Ok(()),
    }
}

pub async fn check_version(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    match ctx.head {
        Some(head) if block.version < head.version => reject(
            "check_version",
            "Block version must not be lower than previous block version",
        ),
        _ => Ok(()),
    }
}

pub async fn check_previous_hash_matches_head(
    block: &Block,
    ctx: &GlobalContext<'_>,
) -> GlobalResult {
    match ctx.head {
        Some(head) if block.previous_hash != Some(head.hash()) => reject(
            "check_previous_hash_matches_head",
            "PreviousHash not matching hash of current block",
        ),
        _ => Ok(()),
    }
}

pub async fn check_previous_issuer_matches_head(
    block: &Block,
    ctx: &GlobalContext<'_>,
) -> GlobalResult {
    match ctx.head {
        Some(head) if block.previous_issuer != Some(head.issuer) => reject(
            "check_previous_issuer_matches_head",
            "PreviousIssuer not matching issuer of current block",
        ),
        _ => Ok(()),
    }
}

/// Median time a block numbered `number` must carry: the median of the
/// times of the last `median_time_blocks` blocks, the rounded-up mean of the
/// two middle values for an even count.
pub async fn expected_median_time(
    number: u64,
    params: &ConsensusParams,
    head: &Block,
    reader: &dyn LedgerReader,
) -> Result<u64, StorageError> {
    let count = params.median_time_blocks.min(number).max(1);
    let from = number.saturating_sub(count);
    let mut times: Vec<u64> = reader
        .blocks_range(count, from)
        .await?
        .iter()
        .map(|b| b.time)
        .collect();
    if times.is_empty() {
        times.push(head.time);
    }
    Ok(median(&mut times))
}

pub async fn check_median_time(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    let Some(head) = ctx.head else {
        return Ok(());
    };
    let expected = expected_median_time(block.number, ctx.params, head, ctx.reader).await?;
    if block.median_time != expected {
        return reject(
            "check_median_time",
            "MedianTime must equal the median of previous blocks' times",
        );
    }
    Ok(())
}

fn median(times: &mut [u64]) -> u64 {
    times.sort_unstable();
    let middle = times.len() / 2;
    if times.len() % 2 == 1 {
        times[middle]
    } else {
        let sum = u128::from(times[middle - 1]) + u128::from(times[middle]);
        sum.div_ceil(2) as u64
    }
}

pub async fn check_time_increment(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    match ctx.head {
        Some(head) if block.time < head.time => reject(
            "check_time_increment",
            "Block time must not be lower than previous block time",
        ),
        _ => Ok(()),
    }
}

pub async fn check_identities_are_new(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    for identity in &block.identities {
        let known = ctx.reader.identity(&identity.issuer).await?.is_some()
            || ctx.reader.identity_by_uid(&identity.uid).await?.is_some();
        if known {
            return reject("check_identities_are_new", "Identity already used");
        }
    }
    Ok(())
}

/// Joiners without an identity in the block must have a known identity
/// that is neither a member nor revoked.
pub async fn check_joiners(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    const RULE: &str = "check_joiners";
    let newcomers: HashSet<PublicKey> = block.identities.iter().map(|i| i.issuer).collect();
    for joiner in &block.joiners {
        if newcomers.contains(&joiner.issuer) {
            continue;
        }
        let Some(identity) = ctx.reader.identity(&joiner.issuer).await? else {
            return reject(RULE, "Joiner has no known identity");
        };
        if identity.member {
            return reject(RULE, "Cannot join: already a member");
        }
        if identity.revoked {
            return reject(RULE, "Cannot join: identity is revoked");
        }
    }
    Ok(())
}

async fn is_member(ctx: &GlobalContext<'_>, pubkey: &PublicKey) -> Result<bool, LedgerError> {
    Ok(ctx
        .reader
        .identity(pubkey)
        .await?
        .map(|identity| identity.member)
        .unwrap_or(false))
}

pub async fn check_actives_are_members(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    for active in &block.actives {
        if !is_member(ctx, &active.issuer).await? {
            return reject(
                "check_actives_are_members",
                "Only members can renew their membership",
            );
        }
    }
    Ok(())
}

pub async fn check_leavers_are_members(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    for leaver in &block.leavers {
        if !is_member(ctx, &leaver.issuer).await? {
            return reject("check_leavers_are_members", "Only members can leave");
        }
    }
    Ok(())
}

pub async fn check_excluded_are_members(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    for excluded in &block.excluded {
        if !is_member(ctx, excluded).await? {
            return reject("check_excluded_are_members", "Excluded pubkey is not a member");
        }
    }
    Ok(())
}

pub async fn check_revoked_are_known(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    const RULE: &str = "check_revoked_are_known";
    for revocation in &block.revoked {
        match ctx.reader.identity(&revocation.pubkey).await? {
            None => return reject(RULE, "Cannot revoke an unknown identity"),
            Some(identity) if identity.revoked => {
                return reject(RULE, "Identity already revoked")
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// On the root block the founding joiners certify each other.
pub async fn check_certifiers_are_members(
    block: &Block,
    ctx: &GlobalContext<'_>,
) -> GlobalResult {
    let joiners: HashSet<PublicKey> = block.joiners.iter().map(|ms| ms.issuer).collect();
    for cert in &block.certifications {
        let founder = block.is_root() && joiners.contains(&cert.issuer);
        if !founder && !is_member(ctx, &cert.issuer).await? {
            return reject(
                "check_certifiers_are_members",
                "Certification issuer must be a member",
            );
        }
    }
    Ok(())
}

pub async fn check_certified_are_members_or_newcomers(
    block: &Block,
    ctx: &GlobalContext<'_>,
) -> GlobalResult {
    let joiners: HashSet<PublicKey> = block.joiners.iter().map(|ms| ms.issuer).collect();
    for cert in &block.certifications {
        if !joiners.contains(&cert.receiver) && !is_member(ctx, &cert.receiver).await? {
            return reject(
                "check_certified_are_members_or_newcomers",
                "Certification receiver must be a member or a newcomer",
            );
        }
    }
    Ok(())
}

/// Each joiner gathers at least `sig_qty` distinct certifiers, counting the
/// block's certifications and the still valid persisted ones.
pub async fn check_newcomers_certifications(
    block: &Block,
    ctx: &GlobalContext<'_>,
) -> GlobalResult {
    let received = certifications_received(block);
    for joiner in &block.joiners {
        let mut issuers = received.get(&joiner.issuer).cloned().unwrap_or_default();
        for cert in ctx.reader.certifications_to(&joiner.issuer).await? {
            if cert.expires_on > block.median_time {
                issuers.insert(cert.issuer);
            }
        }
        if (issuers.len() as u64) < u64::from(ctx.params.sig_qty) {
            return reject(
                "check_newcomers_certifications",
                "Newcomer does not have enough certifications",
            );
        }
    }
    Ok(())
}

pub async fn check_members_count(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    let previous = ctx.head.map_or(0, |head| head.members_count);
    let expected = (previous + block.joiners.len() as u64).checked_sub(block.excluded.len() as u64);
    if expected != Some(block.members_count) {
        return reject("check_members_count", "Wrong members count");
    }
    Ok(())
}

pub async fn check_dividend(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    const RULE: &str = "check_dividend";
    if ctx.head.is_none() {
        if block.dividend.is_some() {
            return reject(RULE, "Dividend is not due yet");
        }
        return Ok(());
    }

    let state = ctx.reader.monetary_state().await?;
    match (dividend_due(&state, block.median_time), block.dividend) {
        (false, Some(_)) => reject(RULE, "Dividend is not due yet"),
        (true, None) => reject(RULE, "Dividend is due but missing"),
        (true, Some(amount)) => {
            let expected = expected_dividend(ctx.params, &state);
            if amount != expected.amount || block.unit_base != Some(expected.base) {
                return reject(RULE, "Wrong dividend amount");
            }
            Ok(())
        }
        (false, None) => Ok(()),
    }
}

/// Mass grows by the dividend paid to every member of the block.
pub async fn check_monetary_mass(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    let previous = i128::from(ctx.head.map_or(0, |head| head.monetary_mass));
    let created = match block.dividend {
        Some(amount) => amount_in_base_units(amount, block.unit_base.unwrap_or(0))
            .and_then(|value| value.checked_mul(i128::from(block.members_count))),
        None => Some(0),
    };
    if created.and_then(|created| created.checked_add(previous))
        != Some(i128::from(block.monetary_mass))
    {
        return reject("check_monetary_mass", "Wrong monetary mass");
    }
    Ok(())
}

/// Every transaction, in order, may spend outputs of the ones before it.
pub async fn check_transactions(block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
    let tx_ctx = ctx.at(block.median_time);
    let mut scope = SourceScope::new();
    for tx in &block.transactions {
        check_single_transaction(tx, &tx_ctx, &scope).await?;
        scope.record_outputs(tx, block.median_time);
    }
    Ok(())
}
