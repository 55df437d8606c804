//! Ports of the document services.

pub mod inbound;
pub mod outbound;

pub use inbound::{BlockApi, TransactionApi};
pub use outbound::{
    AdmissionDelegate, LedgerStore, PeerInfo, PendingRequirement, RemoteContacter,
};
