//! Balance Mutator
//!
//! The only code path that writes a balance. Policy (sufficiency checks,
//! same-account rules) lives in the handlers above it.

use std::sync::Arc;

use crate::domain::{Account, DomainError};
use crate::error::AppError;
use crate::ledger::{LedgerStore, LedgerTx};

use super::BalanceChange;

/// Applies signed deltas to single accounts
#[derive(Clone)]
pub struct BalanceMutator {
    store: Arc<dyn LedgerStore>,
}

impl BalanceMutator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Apply `delta` to `account` in a unit of work of its own
    ///
    /// Only `account.id` is used. The balance carried by the snapshot is
    /// ignored in favor of the value read under the lock, and the snapshot is
    /// never updated: callers get the new balance from the returned change.
    pub async fn apply_delta(
        &self,
        account: &Account,
        delta: i64,
    ) -> Result<BalanceChange, AppError> {
        let mut tx = self.store.begin().await?;

        let change = Self::apply_delta_in(tx.as_mut(), account.id, delta).await?;

        commit_unit_of_work(tx.as_mut(), || {
            tracing::error!(
                target: "anomaly",
                account_number = change.number,
                delta,
                "Balance commit timed out, outcome unknown"
            );
        })
        .await?;

        tracing::debug!(
            account_number = change.number,
            old_balance = change.old_balance,
            new_balance = change.new_balance,
            "Balance updated"
        );

        Ok(change)
    }

    /// Apply `delta` to account `account_id` inside a caller-owned unit of work
    ///
    /// Locks the account if the unit of work does not hold it yet. Nothing is
    /// visible to other readers until the caller commits.
    pub async fn apply_delta_in(
        tx: &mut dyn LedgerTx,
        account_id: i64,
        delta: i64,
    ) -> Result<BalanceChange, AppError> {
        let account = tx.lock(account_id).await?;
        let old_balance = tx.read_balance(account_id).await?;

        let new_balance = old_balance
            .checked_add(delta)
            .ok_or(DomainError::BalanceOverflow {
                balance: old_balance,
                delta,
            })?;

        tx.write_balance(account_id, new_balance).await?;

        Ok(BalanceChange {
            number: account.number,
            old_balance,
            new_balance,
        })
    }
}

/// Commit a unit of work, flagging a commit whose outcome is unknown
///
/// A commit that times out may or may not have been applied by the store.
/// `on_unknown` records the anomaly and the caller gets `OutcomeUnknown`
/// rather than a plain store error.
pub(crate) async fn commit_unit_of_work<F>(
    tx: &mut dyn LedgerTx,
    on_unknown: F,
) -> Result<(), AppError>
where
    F: FnOnce(),
{
    match tx.commit().await {
        Ok(()) => Ok(()),
        Err(err) if err.is_outcome_unknown() => {
            on_unknown();
            Err(AppError::OutcomeUnknown(err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}
