//! bank_api Library
//!
//! Account management service whose balance changes go through a single
//! serialized mutation path. Re-exports modules for the binaries and for
//! integration testing.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod ledger;
pub mod telemetry;

mod error;

pub use config::{Config, StoreBackend};
pub use domain::{Account, Amount, AmountError, DomainError, NewAccount, OperationContext};
pub use error::{AppError, AppResult, ErrorResponse};
pub use ledger::{InMemoryLedgerStore, LedgerError, LedgerStore, LedgerTx, PgLedgerStore};
