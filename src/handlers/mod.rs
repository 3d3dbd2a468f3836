//! Command Handlers module
//!
//! Handlers orchestrate balance operations on top of the Ledger Store. The
//! acting account always arrives inside the command; handlers never look it
//! up from request state.

mod account_handler;
mod commands;
mod deposit_handler;
mod mutator;
mod transfer_handler;
mod transfer_state;
mod withdraw_handler;


pub use account_handler::{
    CreateAccountHandler, DeleteAccountCommand, DeleteAccountHandler, LoginHandler,
};
pub use commands::*;
pub use deposit_handler::DepositHandler;
pub use mutator::BalanceMutator;
pub use transfer_handler::TransferHandler;
pub use transfer_state::TransferState;
pub use withdraw_handler::WithdrawHandler;

use crate::domain::{Account, DomainError};
use crate::error::AppError;
use crate::ledger::LedgerStore;

/// Look up an account by number, reporting an unknown number as a domain error
pub(crate) async fn resolve_account(
    store: &dyn LedgerStore,
    number: i64,
) -> Result<Account, AppError> {
    store.get_by_number(number).await.map_err(|err| -> AppError {
        if err.is_not_found() {
            DomainError::account_not_found(number).into()
        } else {
            err.into()
        }
    })
}
