//! # Error Types
//!
//! One error enum for every outcome a document submission can end with,
//! plus the storage error raised by persistence adapters.

use crate::entities::{to_hex, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Document not found where the caller required one.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored data does not decode or does not match its key.
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// Parent block missing when writing a block.
    #[error("Parent block not found: cannot write block at height {height}")]
    ParentNotFound { height: u64 },

    /// Backend operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// A rule rejected a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    /// Name of the failing rule, e.g. `check_parameters`.
    pub rule: &'static str,
    /// Human readable reason, stable across releases.
    pub message: String,
}

impl RuleViolation {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Stable error discriminants exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorKind {
    ValidationFailure = 1001,
    CapacityExceeded = 1007,
    AlreadyProcessed = 2030,
    NoCurrentState = 2040,
    InternalFailure = 9999,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Outcome of a rejected document submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(RuleViolation),

    #[error("Document already processed: {}", to_hex(.0))]
    AlreadyProcessed(Hash),

    #[error("No current block")]
    NoCurrentState,

    #[error("Transaction pool is full")]
    CapacityExceeded,

    #[error("Internal failure: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::ValidationFailure,
            LedgerError::AlreadyProcessed(_) => ErrorKind::AlreadyProcessed,
            LedgerError::NoCurrentState => ErrorKind::NoCurrentState,
            LedgerError::CapacityExceeded => ErrorKind::CapacityExceeded,
            LedgerError::Internal(_) => ErrorKind::InternalFailure,
        }
    }

    /// Whether the caller may resubmit the same document later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::NoCurrentState | LedgerError::CapacityExceeded
        )
    }

    /// The violated rule's message, if this is a validation failure.
    pub fn rule_message(&self) -> Option<&str> {
        match self {
            LedgerError::Validation(violation) => Some(&violation.message),
            _ => None,
        }
    }
}

impl From<RuleViolation> for LedgerError {
    fn from(violation: RuleViolation) -> Self {
        LedgerError::Validation(violation)
    }
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        LedgerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ErrorKind::ValidationFailure.code(), 1001);
        assert_eq!(ErrorKind::CapacityExceeded.code(), 1007);
        assert_eq!(ErrorKind::AlreadyProcessed.code(), 2030);
        assert_eq!(ErrorKind::NoCurrentState.code(), 2040);
        assert_eq!(ErrorKind::InternalFailure.code(), 9999);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(LedgerError::NoCurrentState.is_retryable());
        assert!(LedgerError::CapacityExceeded.is_retryable());
        assert!(!LedgerError::AlreadyProcessed([0; 32]).is_retryable());
        assert!(!LedgerError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn test_validation_displays_rule_message() {
        let err = LedgerError::from(RuleViolation::new(
            "check_parameters",
            "Parameters must be provided for root block",
        ));
        assert_eq!(err.to_string(), "Parameters must be provided for root block");
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[test]
    fn test_storage_error_is_internal() {
        let err = LedgerError::from(StorageError::DatabaseError("disk".into()));
        assert_eq!(err.kind(), ErrorKind::InternalFailure);
        assert!(err.to_string().contains("disk"));
    }
}
