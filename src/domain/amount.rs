//! Amount type
//!
//! Domain primitive for the amount of a deposit, withdrawal or transfer,
//! expressed in the smallest currency unit. Amounts are validated at
//! construction time, so a zero or negative amount cannot reach the
//! balance mutator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount represents a validated, strictly positive quantity of money.
///
/// # Invariants
/// - Value is always positive (> 0)
///
/// # Example
/// ```
/// use bank_api::domain::Amount;
///
/// let amount = Amount::new(250).unwrap();
/// assert_eq!(amount.value(), 250);
/// assert_eq!(amount.as_debit(), -250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(i64),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NotPositive(value));
        }

        Ok(Self(value))
    }

    /// Get the underlying value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Signed delta that credits this amount.
    pub fn as_credit(&self) -> i64 {
        self.0
    }

    /// Signed delta that debits this amount.
    pub fn as_debit(&self) -> i64 {
        // i64::MIN is unreachable since the value is positive
        -self.0
    }

    /// Check whether `balance` covers this amount.
    pub fn is_covered_by(&self, balance: i64) -> bool {
        balance >= self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Amount {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
