//! Command definitions
//!
//! Commands represent intentions to change the system state. Every balance
//! command names the acting account explicitly.

use serde::{Deserialize, Serialize};

// =========================================================================
// Account commands
// =========================================================================

/// Command to open a new account
#[derive(Debug, Clone)]
pub struct CreateAccountCommand {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl CreateAccountCommand {
    pub fn new(first_name: String, last_name: String, password: String) -> Self {
        Self {
            first_name,
            last_name,
            password,
        }
    }
}

/// Command to authenticate with account number and password
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub number: i64,
    pub password: String,
}

impl LoginCommand {
    pub fn new(number: i64, password: String) -> Self {
        Self { number, password }
    }
}

// =========================================================================
// Balance commands
// =========================================================================

/// Command to deposit into the acting account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositCommand {
    pub account_number: i64,
    pub amount: i64,
}

impl DepositCommand {
    pub fn new(account_number: i64, amount: i64) -> Self {
        Self {
            account_number,
            amount,
        }
    }
}

/// Command to withdraw from the acting account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawCommand {
    pub account_number: i64,
    pub amount: i64,
}

impl WithdrawCommand {
    pub fn new(account_number: i64, amount: i64) -> Self {
        Self {
            account_number,
            amount,
        }
    }
}

/// Command to move money from the acting account to another account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferCommand {
    /// Acting account, debited
    pub from_number: i64,
    /// Destination account, credited
    pub to_number: i64,
    pub amount: i64,
}

impl TransferCommand {
    pub fn new(from_number: i64, to_number: i64, amount: i64) -> Self {
        Self {
            from_number,
            to_number,
            amount,
        }
    }
}

// =========================================================================
// Results
// =========================================================================

/// Balance of one account before and after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    pub number: i64,
    pub old_balance: i64,
    pub new_balance: i64,
}

impl BalanceChange {
    /// Signed delta that produced this change
    pub fn delta(&self) -> i64 {
        self.new_balance - self.old_balance
    }
}

/// Result of a completed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub from: BalanceChange,
    pub to: BalanceChange,
    pub amount: i64,
}

/// Result of a successful account creation or login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub id: i64,
    pub number: i64,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_change_delta() {
        let change = BalanceChange {
            number: 1,
            old_balance: 500,
            new_balance: 300,
        };
        assert_eq!(change.delta(), -200);
    }

    #[test]
    fn test_balance_change_wire_format() {
        let change = BalanceChange {
            number: 123,
            old_balance: 0,
            new_balance: 500,
        };
        let json = serde_json::to_value(change).unwrap();

        assert_eq!(json["number"], 123);
        assert_eq!(json["oldBalance"], 0);
        assert_eq!(json["newBalance"], 500);
    }

    #[test]
    fn test_transfer_command() {
        let cmd = TransferCommand::new(123, 456, 200);
        assert_eq!(cmd.from_number, 123);
        assert_eq!(cmd.to_number, 456);
        assert_eq!(cmd.amount, 200);
    }
}
