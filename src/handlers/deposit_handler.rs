//! Deposit Handler
//!
//! Credits the acting account. Deposits need no sufficiency check, so the
//! mutator's own unit of work is enough.

use std::sync::Arc;

use crate::domain::{Amount, OperationContext};
use crate::error::AppError;
use crate::ledger::LedgerStore;

use super::mutator::BalanceMutator;
use super::{resolve_account, BalanceChange, DepositCommand};

/// Handler for deposits
pub struct DepositHandler {
    store: Arc<dyn LedgerStore>,
    mutator: BalanceMutator,
}

impl DepositHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            mutator: BalanceMutator::new(Arc::clone(&store)),
            store,
        }
    }

    /// Execute the deposit command
    pub async fn execute(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> Result<BalanceChange, AppError> {
        let amount = Amount::new(command.amount)?;

        let account = resolve_account(self.store.as_ref(), command.account_number).await?;
        let change = self.mutator.apply_delta(&account, amount.as_credit()).await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            account_number = change.number,
            amount = amount.value(),
            new_balance = change.new_balance,
            "Deposit completed"
        );

        Ok(change)
    }
}
