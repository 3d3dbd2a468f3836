//! Withdraw Handler

use std::sync::Arc;

use crate::domain::{Amount, DomainError, OperationContext};
use crate::error::AppError;
use crate::ledger::LedgerStore;

use super::mutator::{commit_unit_of_work, BalanceMutator};
use super::{resolve_account, BalanceChange, WithdrawCommand};

/// Handler for withdrawals
///
/// The sufficiency check and the debit share one lock scope, so a
/// concurrent withdrawal cannot spend the same funds in between.
pub struct WithdrawHandler {
    store: Arc<dyn LedgerStore>,
}

impl WithdrawHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute the withdraw command
    pub async fn execute(
        &self,
        command: WithdrawCommand,
        context: &OperationContext,
    ) -> Result<BalanceChange, AppError> {
        let amount = Amount::new(command.amount)?;

        let account = resolve_account(self.store.as_ref(), command.account_number).await?;

        let mut tx = self.store.begin().await?;
        tx.lock(account.id).await?;

        let available = tx.read_balance(account.id).await?;
        if !amount.is_covered_by(available) {
            tracing::info!(
                correlation_id = ?context.correlation_id,
                client_ip = ?context.client_ip,
                account_number = account.number,
                amount = amount.value(),
                available,
                "Withdrawal rejected"
            );
            return Err(DomainError::insufficient_balance(amount.value(), available).into());
        }

        let change =
            BalanceMutator::apply_delta_in(tx.as_mut(), account.id, amount.as_debit()).await?;

        commit_unit_of_work(tx.as_mut(), || {
            tracing::error!(
                target: "anomaly",
                correlation_id = ?context.correlation_id,
                client_ip = ?context.client_ip,
                account_number = account.number,
                amount = amount.value(),
                "Withdrawal commit timed out, outcome unknown"
            );
        })
        .await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            account_number = change.number,
            amount = amount.value(),
            new_balance = change.new_balance,
            "Withdrawal completed"
        );

        Ok(change)
    }
}
