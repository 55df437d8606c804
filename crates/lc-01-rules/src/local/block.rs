//! Local rules on block structure and web-of-trust content.

use super::{fail, RuleResult};
use crate::context::RuleContext;
use lc_02_indexer::{IndexEntry, IndexKind};
use shared_types::{to_hex, Block, MembershipEvent, PublicKey};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// True when `items` contains the same key twice.
fn has_duplicates<K: Eq + Hash>(items: impl IntoIterator<Item = K>) -> bool {
    let mut seen = HashSet::new();
    items.into_iter().any(|item| !seen.insert(item))
}

pub fn check_parameters(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    const RULE: &str = "check_parameters";
    match (block.is_root(), block.parameters.is_some()) {
        (true, false) => fail(RULE, "Parameters must be provided for root block"),
        (false, true) => fail(RULE, "Parameters must not be provided for non-root block"),
        _ => Ok(()),
    }
}

/// The hash must start with `pow_min / 16` zeros, followed by a hex digit
/// no greater than `15 - pow_min % 16`.
pub fn check_proof_of_work(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if satisfies_pow(&to_hex(&block.hash()), block.pow_min) {
        Ok(())
    } else {
        fail("check_proof_of_work", "Not a proof-of-work")
    }
}

fn satisfies_pow(hash_hex: &str, pow_min: u32) -> bool {
    let zeros = (pow_min / 16) as usize;
    let max_digit = 15 - pow_min % 16;
    let mut digits = hash_hex.chars();
    for _ in 0..zeros {
        if digits.next() != Some('0') {
            return false;
        }
    }
    match digits.next().and_then(|c| c.to_digit(16)) {
        Some(digit) => digit <= max_digit,
        None => false,
    }
}

pub fn check_inner_hash(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if block.inner_hash == block.compute_inner_hash() {
        Ok(())
    } else {
        fail("check_inner_hash", "Wrong inner hash")
    }
}

pub fn check_previous_hash(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    const RULE: &str = "check_previous_hash";
    match (block.is_root(), block.previous_hash.is_some()) {
        (true, true) => fail(RULE, "PreviousHash must not be provided for root block"),
        (false, false) => fail(RULE, "PreviousHash must be provided for non-root block"),
        _ => Ok(()),
    }
}

pub fn check_previous_issuer(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    const RULE: &str = "check_previous_issuer";
    match (block.is_root(), block.previous_issuer.is_some()) {
        (true, true) => fail(RULE, "PreviousIssuer must not be provided for root block"),
        (false, false) => fail(RULE, "PreviousIssuer must be provided for non-root block"),
        _ => Ok(()),
    }
}

pub fn check_unit_base(block: &Block, _ctx: &RuleContext<'_>, _index: &[IndexEntry]) -> RuleResult {
    const RULE: &str = "check_unit_base";
    let needs_base = block.is_root() || block.dividend.is_some();
    if needs_base && block.unit_base.is_none() {
        return fail(RULE, "Document has unkown fields or wrong line ending format");
    }
    if block.is_root() && block.unit_base != Some(0) {
        return fail(RULE, "UnitBase must equal 0 for root block");
    }
    Ok(())
}

pub fn check_block_signature(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    let payload = block.signing_payload();
    if ctx
        .verifier
        .verify(&block.signature, payload.as_bytes(), &block.issuer)
    {
        Ok(())
    } else {
        fail("check_block_signature", "Block's signature must match")
    }
}

pub fn check_block_times(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    const RULE: &str = "check_block_times";
    let max_acceleration = ctx.params.max_acceleration();
    if block.is_root() {
        if block.time != block.median_time {
            return fail(RULE, "Root block must have Time equal MedianTime");
        }
        return Ok(());
    }
    let upper = block.median_time.saturating_add(max_acceleration);
    if block.time < block.median_time || block.time > upper {
        return fail(
            RULE,
            format!(
                "A block must have its Time between MedianTime and MedianTime + {}",
                max_acceleration
            ),
        );
    }
    Ok(())
}

pub fn check_identities_signature(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    for idty in &block.identities {
        let payload = idty.signing_payload(&block.currency);
        if !ctx.verifier.verify(&idty.signature, payload.as_bytes(), &idty.issuer) {
            return fail("check_identities_signature", "Identity's signature must match");
        }
    }
    Ok(())
}

pub fn check_identities_user_id_conflict(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if has_duplicates(block.identities.iter().map(|idty| idty.uid.as_str())) {
        return fail(
            "check_identities_user_id_conflict",
            "Block must not contain twice same identity uid",
        );
    }
    Ok(())
}

pub fn check_identities_pubkey_conflict(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if has_duplicates(block.identities.iter().map(|idty| idty.issuer)) {
        return fail(
            "check_identities_pubkey_conflict",
            "Block must not contain twice same identity pubkey",
        );
    }
    Ok(())
}

pub fn check_identities_match_join(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    for idty in &block.identities {
        let matched = block.joiners.iter().any(|ms| {
            ms.issuer == idty.issuer
                && ms.uid == idty.uid
                && ms.identity_created_on == idty.created_on
        });
        if !matched {
            return fail(
                "check_identities_match_join",
                "Each identity must match a newcomer line with same userid and certts",
            );
        }
    }
    Ok(())
}

/// At most one membership event per pubkey in the index. Exclusions are not
/// counted: a revoked member is expected to be excluded in the same block.
pub fn check_membership_unicity(
    _block: &Block,
    _ctx: &RuleContext<'_>,
    index: &[IndexEntry],
) -> RuleResult {
    let pubkeys = index.iter().filter_map(|entry| match &entry.kind {
        IndexKind::Membership { pubkey, event, .. } if *event != MembershipEvent::Exclude => {
            Some(*pubkey)
        }
        _ => None,
    });
    if has_duplicates(pubkeys) {
        return fail(
            "check_membership_unicity",
            "Unicity constraint PUBLIC_KEY on MINDEX is not respected",
        );
    }
    Ok(())
}

pub fn check_revoked_unicity(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if has_duplicates(block.revoked.iter().map(|rev| rev.pubkey)) {
        return fail("check_revoked_unicity", "A single revocation per member is allowed");
    }
    Ok(())
}

pub fn check_revoked_are_excluded(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    let excluded: HashSet<&PublicKey> = block.excluded.iter().collect();
    if block.revoked.iter().any(|rev| !excluded.contains(&rev.pubkey)) {
        return fail("check_revoked_are_excluded", "A revoked member must be excluded");
    }
    Ok(())
}

pub fn check_memberships_signature(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    let all = block.joiners.iter().chain(&block.actives).chain(&block.leavers);
    for ms in all {
        let payload = ms.signing_payload(&block.currency);
        if !ctx.verifier.verify(&ms.signature, payload.as_bytes(), &ms.issuer) {
            return fail("check_memberships_signature", "Membership's signature must match");
        }
    }
    Ok(())
}

pub fn check_pubkey_unicity(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if has_duplicates(block.membership_pubkeys()) {
        return fail(
            "check_pubkey_unicity",
            "Block cannot contain a same pubkey more than once in joiners, actives, leavers and excluded",
        );
    }
    Ok(())
}

pub fn check_certification_one_by_issuer(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    if has_duplicates(block.certifications.iter().map(|cert| cert.issuer)) {
        return fail(
            "check_certification_one_by_issuer",
            "Block cannot contain two certifications from same issuer",
        );
    }
    Ok(())
}

pub fn check_certification_unicity(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    let pairs = block
        .certifications
        .iter()
        .map(|cert| (cert.issuer, cert.receiver));
    if has_duplicates(pairs) {
        return fail(
            "check_certification_unicity",
            "Block cannot contain identical certifications (A -> B)",
        );
    }
    Ok(())
}

pub fn check_certification_isnt_for_leaver_or_excluded(
    block: &Block,
    _ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    let leaving: HashSet<&PublicKey> = block
        .leavers
        .iter()
        .map(|ms| &ms.issuer)
        .chain(&block.excluded)
        .collect();
    if block
        .certifications
        .iter()
        .any(|cert| leaving.contains(&cert.receiver))
    {
        return fail(
            "check_certification_isnt_for_leaver_or_excluded",
            "Block cannot contain certifications concerning leavers or excluded members",
        );
    }
    Ok(())
}

pub fn check_certifications_signature(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    for cert in &block.certifications {
        let payload = cert.signing_payload(&block.currency);
        if !ctx.verifier.verify(&cert.signature, payload.as_bytes(), &cert.issuer) {
            return fail(
                "check_certifications_signature",
                "Certification's signature must match",
            );
        }
    }
    Ok(())
}

pub fn check_revocations_signature(
    block: &Block,
    ctx: &RuleContext<'_>,
    _index: &[IndexEntry],
) -> RuleResult {
    for rev in &block.revoked {
        let payload = rev.signing_payload(&block.currency);
        if !ctx.verifier.verify(&rev.signature, payload.as_bytes(), &rev.pubkey) {
            return fail("check_revocations_signature", "Revocation's signature must match");
        }
    }
    Ok(())
}

/// Certifications received per pubkey in this block, distinct issuers only.
pub fn certifications_received(block: &Block) -> HashMap<PublicKey, HashSet<PublicKey>> {
    let mut received: HashMap<PublicKey, HashSet<PublicKey>> = HashMap::new();
    for cert in &block.certifications {
        received.entry(cert.receiver).or_default().insert(cert.issuer);
    }
    received
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_digit_rules() {
        assert!(satisfies_pow("FFFF", 0));
        assert!(satisfies_pow("0FFF", 16));
        assert!(!satisfies_pow("1FFF", 16));
        // pow_min 18: one zero, then a digit <= 13
        assert!(satisfies_pow("0DFF", 18));
        assert!(!satisfies_pow("0EFF", 18));
        assert!(satisfies_pow("00000000FF", 128));
        assert!(!satisfies_pow("0000000FFF", 128));
    }

    #[test]
    fn test_has_duplicates() {
        assert!(has_duplicates([1, 2, 1]));
        assert!(!has_duplicates([1, 2, 3]));
        assert!(!has_duplicates(Vec::<u8>::new()));
    }
}
