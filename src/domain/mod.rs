//! Domain module
//!
//! Core domain types and business rules of the balance-mutation protocol.

pub mod account;
pub mod amount;
pub mod context;
pub mod error;

pub use account::{Account, NewAccount};
pub use amount::{Amount, AmountError};
pub use context::OperationContext;
pub use error::DomainError;
