//! # Local Rules
//!
//! Checks needing only the block itself, the consensus parameters and a
//! signature verifier. Each rule is a named entry of a declared table;
//! aliases are slices of that table.

pub mod block;
pub mod transaction;

use crate::context::RuleContext;
use lc_02_indexer::IndexEntry;
use shared_types::{Block, RuleViolation};

pub use transaction::check_transaction_locally;

pub type RuleResult = Result<(), RuleViolation>;

pub(crate) fn fail(rule: &'static str, message: impl Into<String>) -> RuleResult {
    Err(RuleViolation::new(rule, message))
}

/// Predicate over a block, its context and its local index.
pub type LocalCheck = fn(&Block, &RuleContext<'_>, &[IndexEntry]) -> RuleResult;

/// A named local rule.
#[derive(Clone, Copy)]
pub struct LocalRule {
    pub name: &'static str,
    pub check: LocalCheck,
}

impl std::fmt::Debug for LocalRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! local_rules {
    ($($konst:ident => $module:ident::$func:ident),* $(,)?) => {
        $(
            pub const $konst: LocalRule = LocalRule {
                name: stringify!($func),
                check: $module::$func,
            };
        )*
    };
}

local_rules! {
    CHECK_PARAMETERS => block::check_parameters,
    CHECK_PROOF_OF_WORK => block::check_proof_of_work,
    CHECK_INNER_HASH => block::check_inner_hash,
    CHECK_PREVIOUS_HASH => block::check_previous_hash,
    CHECK_PREVIOUS_ISSUER => block::check_previous_issuer,
    CHECK_UNIT_BASE => block::check_unit_base,
    CHECK_BLOCK_SIGNATURE => block::check_block_signature,
    CHECK_BLOCK_TIMES => block::check_block_times,
    CHECK_IDENTITIES_SIGNATURE => block::check_identities_signature,
    CHECK_IDENTITIES_USER_ID_CONFLICT => block::check_identities_user_id_conflict,
    CHECK_IDENTITIES_PUBKEY_CONFLICT => block::check_identities_pubkey_conflict,
    CHECK_IDENTITIES_MATCH_JOIN => block::check_identities_match_join,
    CHECK_MEMBERSHIP_UNICITY => block::check_membership_unicity,
    CHECK_REVOKED_UNICITY => block::check_revoked_unicity,
    CHECK_REVOKED_ARE_EXCLUDED => block::check_revoked_are_excluded,
    CHECK_MEMBERSHIPS_SIGNATURE => block::check_memberships_signature,
    CHECK_PUBKEY_UNICITY => block::check_pubkey_unicity,
    CHECK_CERTIFICATION_ONE_BY_ISSUER => block::check_certification_one_by_issuer,
    CHECK_CERTIFICATION_UNICITY => block::check_certification_unicity,
    CHECK_CERTIFICATION_ISNT_FOR_LEAVER_OR_EXCLUDED => block::check_certification_isnt_for_leaver_or_excluded,
    CHECK_CERTIFICATIONS_SIGNATURE => block::check_certifications_signature,
    CHECK_REVOCATIONS_SIGNATURE => block::check_revocations_signature,
    CHECK_TX_VERSION => transaction::check_tx_version,
    CHECK_TX_LEN => transaction::check_tx_len,
    CHECK_TX_ISSUERS => transaction::check_tx_issuers,
    CHECK_TX_SOURCES => transaction::check_tx_sources,
    CHECK_TX_RECIPIENTS => transaction::check_tx_recipients,
    CHECK_TX_AMOUNTS => transaction::check_tx_amounts,
    CHECK_TX_SIGNATURE => transaction::check_tx_signature,
    CHECK_TX_CHAINING_DEPTH => transaction::check_tx_chaining_depth,
}

/// Every local rule, in evaluation order.
pub const ALL_LOCAL: &[LocalRule] = &[
    CHECK_PARAMETERS,
    CHECK_PROOF_OF_WORK,
    CHECK_INNER_HASH,
    CHECK_PREVIOUS_HASH,
    CHECK_PREVIOUS_ISSUER,
    CHECK_UNIT_BASE,
    CHECK_BLOCK_SIGNATURE,
    CHECK_BLOCK_TIMES,
    CHECK_IDENTITIES_SIGNATURE,
    CHECK_IDENTITIES_USER_ID_CONFLICT,
    CHECK_IDENTITIES_PUBKEY_CONFLICT,
    CHECK_IDENTITIES_MATCH_JOIN,
    CHECK_MEMBERSHIP_UNICITY,
    CHECK_REVOKED_UNICITY,
    CHECK_REVOKED_ARE_EXCLUDED,
    CHECK_MEMBERSHIPS_SIGNATURE,
    CHECK_PUBKEY_UNICITY,
    CHECK_CERTIFICATION_ONE_BY_ISSUER,
    CHECK_CERTIFICATION_UNICITY,
    CHECK_CERTIFICATION_ISNT_FOR_LEAVER_OR_EXCLUDED,
    CHECK_CERTIFICATIONS_SIGNATURE,
    CHECK_REVOCATIONS_SIGNATURE,
    CHECK_TX_VERSION,
    CHECK_TX_LEN,
    CHECK_TX_ISSUERS,
    CHECK_TX_SOURCES,
    CHECK_TX_RECIPIENTS,
    CHECK_TX_AMOUNTS,
    CHECK_TX_SIGNATURE,
    CHECK_TX_CHAINING_DEPTH,
];

/// Local rules a block producer runs before computing the proof-of-work and
/// signing: everything but those two checks.
pub const ALL_LOCAL_BUT_POW_AND_SIGNATURE: &[LocalRule] = &[
    CHECK_PARAMETERS,
    CHECK_INNER_HASH,
    CHECK_PREVIOUS_HASH,
    CHECK_PREVIOUS_ISSUER,
    CHECK_UNIT_BASE,
    CHECK_BLOCK_TIMES,
    CHECK_IDENTITIES_SIGNATURE,
    CHECK_IDENTITIES_USER_ID_CONFLICT,
    CHECK_IDENTITIES_PUBKEY_CONFLICT,
    CHECK_IDENTITIES_MATCH_JOIN,
    CHECK_MEMBERSHIP_UNICITY,
    CHECK_REVOKED_UNICITY,
    CHECK_REVOKED_ARE_EXCLUDED,
    CHECK_MEMBERSHIPS_SIGNATURE,
    CHECK_PUBKEY_UNICITY,
    CHECK_CERTIFICATION_ONE_BY_ISSUER,
    CHECK_CERTIFICATION_UNICITY,
    CHECK_CERTIFICATION_ISNT_FOR_LEAVER_OR_EXCLUDED,
    CHECK_CERTIFICATIONS_SIGNATURE,
    CHECK_REVOCATIONS_SIGNATURE,
    CHECK_TX_VERSION,
    CHECK_TX_LEN,
    CHECK_TX_ISSUERS,
    CHECK_TX_SOURCES,
    CHECK_TX_RECIPIENTS,
    CHECK_TX_AMOUNTS,
    CHECK_TX_SIGNATURE,
    CHECK_TX_CHAINING_DEPTH,
];

/// Look a single local rule up by name.
pub fn local_rule(name: &str) -> Option<LocalRule> {
    ALL_LOCAL.iter().copied().find(|rule| rule.name == name)
}

/// Look an alias up by name.
pub fn local_alias(name: &str) -> Option<&'static [LocalRule]> {
    match name {
        "ALL_LOCAL" => Some(ALL_LOCAL),
        "ALL_LOCAL_BUT_POW_AND_SIGNATURE" => Some(ALL_LOCAL_BUT_POW_AND_SIGNATURE),
        _ => None,
    }
}
