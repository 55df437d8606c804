//! Pipeline failures not produced by the units themselves.

use shared_types::LedgerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The consumer task has stopped; nothing will run the unit.
    #[error("Commit pipeline is closed")]
    Closed,

    /// The unit panicked before producing an outcome.
    #[error("Commit unit panicked")]
    UnitPanicked,
}

impl From<PipelineError> for LedgerError {
    fn from(err: PipelineError) -> Self {
        LedgerError::Internal(err.to_string())
    }
}
