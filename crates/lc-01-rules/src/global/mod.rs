//! # Global Rules
//!
//! Checks needing the persisted ledger state. They suspend on reader calls,
//! so the table holds a closed set of rule identifiers dispatched to async
//! functions rather than function pointers.

pub mod block;
pub mod transaction;

use crate::context::GlobalContext;
use shared_types::{Block, LedgerError, RuleViolation};

pub use block::expected_median_time;
pub use transaction::{
    check_single_transaction, check_tx_blockstamp, check_tx_currency, SourceScope,
};

pub type GlobalResult = Result<(), LedgerError>;

pub(crate) fn reject(rule: &'static str, message: impl Into<String>) -> GlobalResult {
    Err(RuleViolation::new(rule, message).into())
}

/// A named global block rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalRule {
    Number,
    Currency,
    Version,
    PowMin,
    PreviousHashMatchesHead,
    PreviousIssuerMatchesHead,
    MedianTime,
    TimeIncrement,
    IdentitiesAreNew,
    Joiners,
    ActivesAreMembers,
    LeaversAreMembers,
    ExcludedAreMembers,
    RevokedAreKnown,
    CertifiersAreMembers,
    CertifiedAreMembersOrNewcomers,
    NewcomersCertifications,
    MembersCount,
    Dividend,
    MonetaryMass,
    Transactions,
}

impl GlobalRule {
    pub fn name(self) -> &'static str {
        match self {
            GlobalRule::Number => "check_number",
            GlobalRule::Currency => "check_currency",
            GlobalRule::Version => "check_version",
            GlobalRule::PowMin => "check_pow_min",
            GlobalRule::PreviousHashMatchesHead => "check_previous_hash_matches_head",
            GlobalRule::PreviousIssuerMatchesHead => "check_previous_issuer_matches_head",
            GlobalRule::MedianTime => "check_median_time",
            GlobalRule::TimeIncrement => "check_time_increment",
            GlobalRule::IdentitiesAreNew => "check_identities_are_new",
            GlobalRule::Joiners => "check_joiners",
            GlobalRule::ActivesAreMembers => "check_actives_are_members",
            GlobalRule::LeaversAreMembers => "check_leavers_are_members",
            GlobalRule::ExcludedAreMembers => "check_excluded_are_members",
            GlobalRule::RevokedAreKnown => "check_revoked_are_known",
            GlobalRule::CertifiersAreMembers => "check_certifiers_are_members",
            GlobalRule::CertifiedAreMembersOrNewcomers => {
                "check_certified_are_members_or_newcomers"
            }
            GlobalRule::NewcomersCertifications => "check_newcomers_certifications",
            GlobalRule::MembersCount => "check_members_count",
            GlobalRule::Dividend => "check_dividend",
            GlobalRule::MonetaryMass => "check_monetary_mass",
            GlobalRule::Transactions => "check_transactions",
        }
    }

    pub async fn check(self, block: &Block, ctx: &GlobalContext<'_>) -> GlobalResult {
        match self {
            GlobalRule::Number => block::check_number(block, ctx).await,
            GlobalRule::Currency => block::check_currency(block, ctx).await,
            GlobalRule::Version => block::check_version(block, ctx).await,
            GlobalRule::PowMin => block::check_pow_min(block, ctx).await,
            GlobalRule::PreviousHashMatchesHead => {
                block::check_previous_hash_matches_head(block, ctx).await
            }
            GlobalRule::PreviousIssuerMatchesHead => {
                block::check_previous_issuer_matches_head(block, ctx).await
            }
            GlobalRule::MedianTime => block::check_median_time(block, ctx).await,
            GlobalRule::TimeIncrement => block::check_time_increment(block, ctx).await,
            GlobalRule::IdentitiesAreNew => block::check_identities_are_new(block, ctx).await,
            GlobalRule::Joiners => block::check_joiners(block, ctx).await,
            GlobalRule::ActivesAreMembers => block::check_actives_are_members(block, ctx).await,
            GlobalRule::LeaversAreMembers => block::check_leavers_are_members(block, ctx).await,
            GlobalRule::ExcludedAreMembers => block::check_excluded_are_members(block, ctx).await,
            GlobalRule::RevokedAreKnown => block::check_revoked_are_known(block, ctx).await,
            GlobalRule::CertifiersAreMembers => {
                block::check_certifiers_are_members(block, ctx).await
            }
            GlobalRule::CertifiedAreMembersOrNewcomers => {
                block::check_certified_are_members_or_newcomers(block, ctx).await
            }
            GlobalRule::NewcomersCertifications => {
                block::check_newcomers_certifications(block, ctx).await
            }
            GlobalRule::MembersCount => block::check_members_count(block, ctx).await,
            GlobalRule::Dividend => block::check_dividend(block, ctx).await,
            GlobalRule::MonetaryMass => block::check_monetary_mass(block, ctx).await,
            GlobalRule::Transactions => block::check_transactions(block, ctx).await,
        }
    }
}

/// Every global rule, in evaluation order.
pub const ALL_GLOBAL: &[GlobalRule] = &[
    GlobalRule::Number,
    GlobalRule::Currency,
    GlobalRule::Version,
    GlobalRule::PowMin,
    GlobalRule::PreviousHashMatchesHead,
    GlobalRule::PreviousIssuerMatchesHead,
    GlobalRule::MedianTime,
    GlobalRule::TimeIncrement,
    GlobalRule::IdentitiesAreNew,
    GlobalRule::Joiners,
    GlobalRule::ActivesAreMembers,
    GlobalRule::LeaversAreMembers,
    GlobalRule::ExcludedAreMembers,
    GlobalRule::RevokedAreKnown,
    GlobalRule::CertifiersAreMembers,
    GlobalRule::CertifiedAreMembersOrNewcomers,
    GlobalRule::NewcomersCertifications,
    GlobalRule::MembersCount,
    GlobalRule::Dividend,
    GlobalRule::MonetaryMass,
    GlobalRule::Transactions,
];

/// Look a single global rule up by name.
pub fn global_rule(name: &str) -> Option<GlobalRule> {
    ALL_GLOBAL.iter().copied().find(|rule| rule.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_and_resolvable() {
        let names: HashSet<&str> = ALL_GLOBAL.iter().map(|rule| rule.name()).collect();
        assert_eq!(names.len(), ALL_GLOBAL.len());
        for rule in ALL_GLOBAL {
            assert_eq!(global_rule(rule.name()), Some(*rule));
        }
        assert_eq!(global_rule("check_everything"), None);
    }
}
