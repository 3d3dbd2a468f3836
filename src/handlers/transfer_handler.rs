//! Transfer Handler
//!
//! Moves money between two accounts. Debit and credit are staged in one unit
//! of work holding both account locks, so either both are committed or
//! neither is.

use std::sync::Arc;

use crate::domain::{Account, Amount, DomainError, OperationContext};
use crate::error::AppError;
use crate::ledger::{lock_in_order, LedgerStore, LedgerTx};

use super::mutator::{commit_unit_of_work, BalanceMutator};
use super::transfer_state::TransferState;
use super::{resolve_account, BalanceChange, TransferCommand, TransferResult};

/// Handler for transfers between accounts
pub struct TransferHandler {
    store: Arc<dyn LedgerStore>,
}

impl TransferHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute the transfer command
    pub async fn execute(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> Result<TransferResult, AppError> {
        let mut state = TransferState::default();

        let (mut tx, amount, from, to) = match self.validate(&command).await {
            Ok(prepared) => prepared,
            Err(err) => {
                state = state.transition(TransferState::Aborted)?;
                tracing::info!(
                    correlation_id = ?context.correlation_id,
                    client_ip = ?context.client_ip,
                    from = command.from_number,
                    to = command.to_number,
                    amount = command.amount,
                    state = %state,
                    error = %err,
                    "Transfer rejected"
                );
                return Err(err);
            }
        };

        let (debit, credit) = match Self::stage(tx.as_mut(), &from, &to, amount, &mut state).await {
            Ok(changes) => changes,
            Err(err) => {
                // Dropping the unit of work discards whatever was staged
                tracing::warn!(
                    correlation_id = ?context.correlation_id,
                    client_ip = ?context.client_ip,
                    from = from.number,
                    to = to.number,
                    amount = amount.value(),
                    state = %state,
                    error = %err,
                    "Transfer rolled back"
                );
                return Err(err);
            }
        };

        commit_unit_of_work(tx.as_mut(), || {
            tracing::error!(
                target: "anomaly",
                correlation_id = ?context.correlation_id,
                client_ip = ?context.client_ip,
                from = from.number,
                to = to.number,
                amount = amount.value(),
                state = %state,
                "Transfer commit timed out, outcome unknown; reconcile both accounts"
            );
        })
        .await?;

        state = state.transition(TransferState::Completed)?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            from = from.number,
            to = to.number,
            amount = amount.value(),
            state = %state,
            "Transfer completed"
        );

        Ok(TransferResult {
            from: debit,
            to: credit,
            amount: amount.value(),
        })
    }

    /// Run every check that must pass before anything is staged
    ///
    /// On success the returned unit of work holds the locks of both accounts
    /// and the sufficiency check has been made against the locked balance.
    async fn validate(
        &self,
        command: &TransferCommand,
    ) -> Result<(Box<dyn LedgerTx>, Amount, Account, Account), AppError> {
        let amount = Amount::new(command.amount)?;

        if command.from_number == command.to_number {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let from = resolve_account(self.store.as_ref(), command.from_number).await?;
        let to = resolve_account(self.store.as_ref(), command.to_number).await?;

        let mut tx = self.store.begin().await?;
        lock_in_order(tx.as_mut(), &[from.id, to.id]).await?;

        let available = tx.read_balance(from.id).await?;
        if !amount.is_covered_by(available) {
            return Err(DomainError::insufficient_balance(amount.value(), available).into());
        }

        Ok((tx, amount, from, to))
    }

    async fn stage(
        tx: &mut dyn LedgerTx,
        from: &Account,
        to: &Account,
        amount: Amount,
        state: &mut TransferState,
    ) -> Result<(BalanceChange, BalanceChange), AppError> {
        *state = state.transition(TransferState::DebitPending)?;
        let debit = BalanceMutator::apply_delta_in(tx, from.id, amount.as_debit()).await?;

        *state = state.transition(TransferState::CreditPending)?;
        let credit = BalanceMutator::apply_delta_in(tx, to.id, amount.as_credit()).await?;

        Ok((debit, credit))
    }
}
