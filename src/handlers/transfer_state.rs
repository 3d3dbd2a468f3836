//! Transfer state machine
//!
//! A transfer validates, debits the source, credits the destination and
//! completes. It can only be aborted while still validating: once the debit
//! is staged the unit of work either commits whole or is rolled back whole.

use std::fmt;

use crate::error::AppError;

/// Transfer FSM states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Checking amount, accounts and funds; nothing staged yet
    #[default]
    Validating,

    /// Debit of the source staged
    DebitPending,

    /// Credit of the destination staged
    CreditPending,

    /// Terminal: both mutations committed
    Completed,

    /// Terminal: rejected during validation, no mutation performed
    Aborted,
}

impl TransferState {
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        matches!(
            (self, next),
            (TransferState::Validating, TransferState::DebitPending)
                | (TransferState::Validating, TransferState::Aborted)
                | (TransferState::DebitPending, TransferState::CreditPending)
                | (TransferState::CreditPending, TransferState::Completed)
        )
    }

    /// Move to `next`, rejecting transitions the machine does not allow
    pub fn transition(self, next: TransferState) -> Result<TransferState, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::Internal(format!(
                "Illegal transfer state transition {} -> {}",
                self, next
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Validating => "VALIDATING",
            TransferState::DebitPending => "DEBIT_PENDING",
            TransferState::CreditPending => "CREDIT_PENDING",
            TransferState::Completed => "COMPLETED",
            TransferState::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
