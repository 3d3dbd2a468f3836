//! Account Handlers
//!
//! Account creation, login and deletion. None of these touch balances
//! except deletion, which waits for in-flight units of work on the account.

use std::sync::Arc;

use crate::auth::{self, JwtKeys};
use crate::domain::{NewAccount, OperationContext};
use crate::error::AppError;
use crate::ledger::{LedgerError, LedgerStore};

use super::{CreateAccountCommand, LoginCommand, SessionResult};

/// Attempts at drawing an unused account number
const MAX_NUMBER_ATTEMPTS: usize = 5;

// =========================================================================
// CreateAccountHandler
// =========================================================================

/// Handler for account creation
pub struct CreateAccountHandler {
    store: Arc<dyn LedgerStore>,
    jwt: Arc<JwtKeys>,
}

impl CreateAccountHandler {
    pub fn new(store: Arc<dyn LedgerStore>, jwt: Arc<JwtKeys>) -> Self {
        Self { store, jwt }
    }

    /// Execute the create account command
    pub async fn execute(
        &self,
        command: CreateAccountCommand,
        context: &OperationContext,
    ) -> Result<SessionResult, AppError> {
        validate_name("firstName", &command.first_name)?;
        validate_name("lastName", &command.last_name)?;
        if command.password.is_empty() {
            return Err(AppError::InvalidRequest("password must not be empty".to_string()));
        }

        let credential_hash = hash_password(command.password).await?;
        let mut new_account =
            NewAccount::new(command.first_name, command.last_name, credential_hash);

        let mut attempt = 1;
        let account = loop {
            match self.store.create(new_account.clone()).await {
                Ok(account) => break account,
                Err(LedgerError::Conflict(number)) if attempt < MAX_NUMBER_ATTEMPTS => {
                    tracing::debug!(number, attempt, "Account number taken, drawing another");
                    new_account.regenerate_number();
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        let token = self.jwt.create_token(account.number)?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            account_id = account.id,
            account_number = account.number,
            "Account created"
        );

        Ok(SessionResult {
            id: account.id,
            number: account.number,
            token,
        })
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} must not be empty", field)));
    }
    // Column is varchar(50)
    if value.chars().count() > 50 {
        return Err(AppError::InvalidRequest(format!(
            "{} must be at most 50 characters",
            field
        )));
    }
    Ok(())
}

// =========================================================================
// LoginHandler
// =========================================================================

/// Handler for password login
pub struct LoginHandler {
    store: Arc<dyn LedgerStore>,
    jwt: Arc<JwtKeys>,
}

impl LoginHandler {
    pub fn new(store: Arc<dyn LedgerStore>, jwt: Arc<JwtKeys>) -> Self {
        Self { store, jwt }
    }

    /// Execute the login command
    ///
    /// An unknown number and a wrong password fail the same way.
    pub async fn execute(
        &self,
        command: LoginCommand,
        context: &OperationContext,
    ) -> Result<SessionResult, AppError> {
        let account = match self.store.get_by_number(command.number).await {
            Ok(account) => account,
            Err(err) if err.is_not_found() => return Err(AppError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        if !verify_password(command.password, account.credential_hash.clone()).await? {
            tracing::info!(
                correlation_id = ?context.correlation_id,
                client_ip = ?context.client_ip,
                account_number = account.number,
                "Login rejected"
            );
            return Err(AppError::InvalidCredentials);
        }

        let token = self.jwt.create_token(account.number)?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            account_number = account.number,
            "Login succeeded"
        );

        Ok(SessionResult {
            id: account.id,
            number: account.number,
            token,
        })
    }
}

// =========================================================================
// DeleteAccountHandler
// =========================================================================

/// Command to delete an account
#[derive(Debug, Clone, Copy)]
pub struct DeleteAccountCommand {
    pub account_id: i64,
}

impl DeleteAccountCommand {
    pub fn new(account_id: i64) -> Self {
        Self { account_id }
    }
}

/// Handler for account deletion
pub struct DeleteAccountHandler {
    store: Arc<dyn LedgerStore>,
}

impl DeleteAccountHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute the delete account command
    pub async fn execute(
        &self,
        command: DeleteAccountCommand,
        context: &OperationContext,
    ) -> Result<i64, AppError> {
        self.store.delete(command.account_id).await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            account_id = command.account_id,
            "Account deleted"
        );

        Ok(command.account_id)
    }
}

// argon2 runs on the blocking pool

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

async fn verify_password(password: String, credential_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || auth::verify_password(&password, &credential_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}
