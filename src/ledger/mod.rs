//! Ledger Store module
//!
//! Persistence abstraction for account records. Two backends implement it:
//! PostgreSQL for production and an in-process store for tests and local
//! runs. Balance changes go through a unit of work (`LedgerTx`) that holds
//! per-account locks across the whole read-modify-write sequence.

mod error;
mod memory;
mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Account, NewAccount};

pub use error::{AccountKey, LedgerError};
pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Keyed store of account records
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Backend name for logging
    fn backend(&self) -> &'static str;

    /// Get an account by internal id
    async fn get(&self, id: i64) -> Result<Account, LedgerError>;

    /// Get an account by its externally-facing number
    async fn get_by_number(&self, number: i64) -> Result<Account, LedgerError>;

    /// All accounts, ordered by id
    async fn list(&self) -> Result<Vec<Account>, LedgerError>;

    /// Store a new account, assigning its id
    ///
    /// Fails with `Conflict` if the account number is already taken.
    async fn create(&self, account: NewAccount) -> Result<Account, LedgerError>;

    /// Overwrite the balance of one account, serialized with units of work
    ///
    /// Fails with `NotFound` if the account no longer exists.
    async fn update_balance(&self, id: i64, new_balance: i64) -> Result<(), LedgerError>;

    /// Delete an account
    async fn delete(&self, id: i64) -> Result<(), LedgerError>;

    /// Open a unit of work
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError>;
}

/// Unit of work over one or more accounts
///
/// Writes are staged until `commit`. Dropping the unit of work without
/// committing discards them and releases every lock.
#[async_trait]
pub trait LedgerTx: Send {
    /// Lock an account for mutation and return its persisted state
    async fn lock(&mut self, id: i64) -> Result<Account, LedgerError>;

    /// Current balance of a locked account, including staged writes
    async fn read_balance(&mut self, id: i64) -> Result<i64, LedgerError>;

    /// Stage a new balance for a locked account
    async fn write_balance(&mut self, id: i64, new_balance: i64) -> Result<(), LedgerError>;

    /// Make all staged writes visible atomically
    async fn commit(&mut self) -> Result<(), LedgerError>;
}

/// Lock several accounts in ascending id order
///
/// Every multi-account unit of work must go through here so that two
/// transfers between the same pair of accounts can never wait on each other
/// in a cycle. Returns the accounts in ascending id order.
pub async fn lock_in_order(
    tx: &mut dyn LedgerTx,
    ids: &[i64],
) -> Result<Vec<Account>, LedgerError> {
    let mut ordered = ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut accounts = Vec::with_capacity(ordered.len());
    for id in ordered {
        accounts.push(tx.lock(id).await?);
    }

    Ok(accounts)
}

/// Run a store operation under a deadline
pub(crate) async fn with_deadline<T, F>(deadline: Duration, operation: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(deadline_ms = %deadline.as_millis(), "Ledger store deadline exceeded");
            Err(LedgerError::Timeout(deadline))
        }
    }
}
