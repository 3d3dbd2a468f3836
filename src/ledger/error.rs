//! Ledger Store Errors
//!
//! Error types for ledger store operations.

use std::fmt;
use std::time::Duration;

/// Key an account was looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKey {
    Id(i64),
    Number(i64),
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKey::Id(id) => write!(f, "id {}", id),
            AccountKey::Number(number) => write!(f, "number {}", number),
        }
    }
}

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No account matches the key
    #[error("Account not found: {0}")]
    NotFound(AccountKey),

    /// Account number uniqueness violated on create
    #[error("Account number already in use: {0}")]
    Conflict(i64),

    /// Write attempted on an account the unit of work does not hold
    #[error("Account {0} is not locked in this unit of work")]
    NotLocked(i64),

    /// Unit of work used after commit
    #[error("Unit of work already finished")]
    Finished,

    /// Deadline elapsed; the outcome of the operation is unknown
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database backend failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Check if this error means the record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }

    /// Check if this error is a store-side failure rather than a lookup miss
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LedgerError::Database(_) | LedgerError::Unavailable(_) | LedgerError::Timeout(_)
        )
    }

    /// Check if the write may or may not have been applied
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, LedgerError::Timeout(_))
    }
}
