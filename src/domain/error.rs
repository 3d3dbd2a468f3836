//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations. Every one of them is
/// raised before any balance is written, so a caller receiving one knows
/// that no mutation happened.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Insufficient balance for debit operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// Invalid amount (zero or negative)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transfer to same account
    #[error("Cannot transfer money to the same account")]
    SameAccountTransfer,

    /// Applying the delta would overflow the balance
    #[error("Balance overflow: {balance} + {delta}")]
    BalanceOverflow { balance: i64, delta: i64 },
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(required: i64, available: i64) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Create an account not found error from any displayable key
    pub fn account_not_found(key: impl std::fmt::Display) -> Self {
        Self::AccountNotFound(key.to_string())
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. }
                | Self::InvalidAmount(_)
                | Self::SameAccountTransfer
                | Self::BalanceOverflow { .. }
        )
    }
}

impl From<super::AmountError> for DomainError {
    fn from(err: super::AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
