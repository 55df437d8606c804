//! # Global Index
//!
//! Completes the local index against persisted state:
//!
//! | Local entry | Resolution |
//! |-------------|------------|
//! | `Join { first: None }` | first join unless the identity was ever a member |
//! | consumed source | conditions copied from the stored source or an earlier output of the block |
//! | (none) | dividend source for every member after the block, when it carries a dividend |

use crate::domain::entries::{sort_entries, IndexEntry, IndexKind, IndexOp};
use crate::domain::local::{local_index, position_count};
use shared_types::{
    to_hex, Block, ConsensusParams, LedgerReader, MembershipEvent, PublicKey, SourceId,
    StorageError,
};
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// Compute the block's full index. Reads state, never writes it.
pub async fn global_index(
    block: &Block,
    params: &ConsensusParams,
    reader: &dyn LedgerReader,
) -> Result<Vec<IndexEntry>, StorageError> {
    let mut entries = local_index(block, params);

    let created_here: HashMap<SourceId, String> = entries
        .iter()
        .filter_map(|entry| match (&entry.op, &entry.kind) {
            (IndexOp::Create, IndexKind::Source { id, conditions, .. }) => {
                Some((*id, conditions.clone()))
            }
            _ => None,
        })
        .collect();

    for entry in entries.iter_mut() {
        match &mut entry.kind {
            IndexKind::Membership {
                pubkey,
                event: event @ MembershipEvent::Join { first: None },
                ..
            } => {
                let was_member = reader
                    .identity(pubkey)
                    .await?
                    .map(|idty| idty.was_member)
                    .unwrap_or(false);
                *event = MembershipEvent::Join {
                    first: Some(!was_member),
                };
            }
            IndexKind::Source {
                id,
                conditions,
                consumed: true,
                ..
            } => {
                if let Some(known) = created_here.get(id) {
                    *conditions = known.clone();
                } else if let Some(source) = reader.source(id).await? {
                    *conditions = source.conditions;
                }
            }
            _ => {}
        }
    }

    if let Some(amount) = block.dividend {
        let base = block.unit_base.unwrap_or(0);
        let written_on = block.blockstamp();
        let mut position = position_count(block);
        for member in members_after(block, reader).await? {
            entries.push(IndexEntry {
                op: IndexOp::Create,
                position,
                written_on,
                kind: IndexKind::Source {
                    id: SourceId::Dividend {
                        issuer: member,
                        block_number: block.number,
                    },
                    amount,
                    base,
                    conditions: format!("SIG({})", to_hex(&member)),
                    consumed: false,
                },
            });
            position += 1;
        }
    }

    sort_entries(&mut entries);
    trace!(block = block.number, entries = entries.len(), "Global index computed");
    Ok(entries)
}

/// Members once the block is applied, sorted by pubkey.
pub async fn members_after(
    block: &Block,
    reader: &dyn LedgerReader,
) -> Result<BTreeSet<PublicKey>, StorageError> {
    let mut members: BTreeSet<PublicKey> = reader.members().await?.into_iter().collect();
    members.extend(block.joiners.iter().map(|ms| ms.issuer));
    for excluded in &block.excluded {
        members.remove(excluded);
    }
    Ok(members)
}
