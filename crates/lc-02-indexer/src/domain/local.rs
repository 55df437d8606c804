//! # Local Index
//!
//! Entries derivable from the block alone. Whether a join is a first join
//! or a rejoin, the conditions of consumed sources and the dividend
//! recipients all need chain state and are left to the global index.

use super::entries::{sort_entries, IndexEntry, IndexKind, IndexOp};
use shared_types::{Block, Blockstamp, ConsensusParams, MembershipEvent, SourceId};
use std::collections::HashSet;

struct Emitter {
    written_on: Blockstamp,
    position: usize,
    entries: Vec<IndexEntry>,
}

impl Emitter {
    fn emit(&mut self, op: IndexOp, kind: IndexKind) {
        self.entries.push(IndexEntry {
            op,
            position: self.position,
            written_on: self.written_on,
            kind,
        });
    }

    /// Move on to the next sub-document.
    fn advance(&mut self) {
        self.position += 1;
    }
}

/// Compute the block's local index, sorted by (category, position).
pub fn local_index(block: &Block, params: &ConsensusParams) -> Vec<IndexEntry> {
    let mut out = Emitter {
        written_on: block.blockstamp(),
        position: 0,
        entries: Vec::new(),
    };
    let membership_expiry = block.median_time.saturating_add(params.ms_validity);
    let certification_expiry = block.median_time.saturating_add(params.sig_validity);

    for idty in &block.identities {
        out.emit(
            IndexOp::Create,
            IndexKind::Identity {
                pubkey: idty.issuer,
                uid: Some(idty.uid.clone()),
                created_on: Some(idty.created_on),
                member: true,
            },
        );
        out.advance();
    }

    let newcomers: HashSet<_> = block.identities.iter().map(|idty| idty.issuer).collect();
    for ms in &block.joiners {
        if newcomers.contains(&ms.issuer) {
            out.emit(
                IndexOp::Create,
                IndexKind::Membership {
                    pubkey: ms.issuer,
                    event: MembershipEvent::Join { first: Some(true) },
                    expires_on: Some(membership_expiry),
                },
            );
        } else {
            out.emit(
                IndexOp::Update,
                IndexKind::Identity {
                    pubkey: ms.issuer,
                    uid: None,
                    created_on: None,
                    member: true,
                },
            );
            out.emit(
                IndexOp::Update,
                IndexKind::Membership {
                    pubkey: ms.issuer,
                    event: MembershipEvent::Join { first: None },
                    expires_on: Some(membership_expiry),
                },
            );
        }
        out.advance();
    }

    for ms in &block.actives {
        out.emit(
            IndexOp::Update,
            IndexKind::Membership {
                pubkey: ms.issuer,
                event: MembershipEvent::Renew,
                expires_on: Some(membership_expiry),
            },
        );
        out.advance();
    }

    for ms in &block.leavers {
        out.emit(
            IndexOp::Update,
            IndexKind::Membership {
                pubkey: ms.issuer,
                event: MembershipEvent::Leave,
                expires_on: None,
            },
        );
        out.advance();
    }

    for revocation in &block.revoked {
        out.emit(
            IndexOp::Update,
            IndexKind::Membership {
                pubkey: revocation.pubkey,
                event: MembershipEvent::Revoke,
                expires_on: None,
            },
        );
        out.advance();
    }

    for pubkey in &block.excluded {
        out.emit(
            IndexOp::Update,
            IndexKind::Identity {
                pubkey: *pubkey,
                uid: None,
                created_on: None,
                member: false,
            },
        );
        out.emit(
            IndexOp::Update,
            IndexKind::Membership {
                pubkey: *pubkey,
                event: MembershipEvent::Exclude,
                expires_on: None,
            },
        );
        out.advance();
    }

    for cert in &block.certifications {
        out.emit(
            IndexOp::Create,
            IndexKind::Certification {
                issuer: cert.issuer,
                receiver: cert.receiver,
                expires_on: certification_expiry,
            },
        );
        out.advance();
    }

    for tx in &block.transactions {
        let tx_hash = tx.hash();
        for input in &tx.inputs {
            out.emit(
                IndexOp::Update,
                IndexKind::Source {
                    id: input.source,
                    amount: input.amount,
                    base: input.base,
                    conditions: String::new(),
                    consumed: true,
                },
            );
            out.advance();
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            out.emit(
                IndexOp::Create,
                IndexKind::Source {
                    id: SourceId::Utxo {
                        tx_hash,
                        output_index: index as u32,
                    },
                    amount: output.amount,
                    base: output.base,
                    conditions: output.conditions.clone(),
                    consumed: false,
                },
            );
            out.advance();
        }
    }

    sort_entries(&mut out.entries);
    out.entries
}

/// Number of positions `local_index` assigns for `block`.
pub(crate) fn position_count(block: &Block) -> usize {
    let tx_positions: usize = block
        .transactions
        .iter()
        .map(|tx| tx.inputs.len() + tx.outputs.len())
        .sum();
    block.identities.len()
        + block.joiners.len()
        + block.actives.len()
        + block.leavers.len()
        + block.revoked.len()
        + block.excluded.len()
        + block.certifications.len()
        + tx_positions
}
