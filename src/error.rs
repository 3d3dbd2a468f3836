//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{AmountError, DomainError};
use crate::ledger::LedgerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid account number or password")]
    InvalidCredentials,

    #[error("Permission Denied")]
    PermissionDenied,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Store errors, propagated unmodified
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    // Server errors (5xx)
    #[error("Outcome unknown, flagged for reconciliation: {0}")]
    OutcomeUnknown(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::Domain(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<crate::auth::AuthError> for AppError {
    fn from(err: crate::auth::AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied"),

            AppError::Domain(domain_err) => match domain_err {
                DomainError::InsufficientBalance { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_balance")
                }
                DomainError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
                DomainError::SameAccountTransfer => {
                    (StatusCode::BAD_REQUEST, "same_account_transfer")
                }
                DomainError::BalanceOverflow { .. } => {
                    (StatusCode::BAD_REQUEST, "balance_overflow")
                }
                DomainError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
            },

            AppError::Ledger(ledger_err) => match ledger_err {
                LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
                LedgerError::Conflict(_) => (StatusCode::CONFLICT, "account_number_conflict"),
                LedgerError::Timeout(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_timeout"),
                LedgerError::Database(_) | LedgerError::Unavailable(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "store_unavailable")
                }
                LedgerError::NotLocked(_) | LedgerError::Finished => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },

            AppError::OutcomeUnknown(_) => (StatusCode::INTERNAL_SERVER_ERROR, "outcome_unknown"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let details = match &self {
            AppError::InvalidRequest(msg) => Some(msg.clone()),
            AppError::Domain(domain_err) if domain_err.is_client_error() => {
                Some(domain_err.to_string())
            }
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, error_code, "Request failed");
        }

        let error = if status.is_server_error() {
            // Store internals stay out of the response body
            match &self {
                AppError::OutcomeUnknown(_) => self.to_string(),
                _ => "Something went wrong".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
