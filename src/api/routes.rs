//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, OperationContext};
use crate::error::AppResult;
use crate::handlers::{
    BalanceChange, CreateAccountCommand, CreateAccountHandler, DeleteAccountCommand,
    DeleteAccountHandler, DepositCommand, DepositHandler, LoginCommand, LoginHandler,
    SessionResult, TransferCommand, TransferHandler, TransferResult, WithdrawCommand,
    WithdrawHandler,
};

use super::extract::ApiJson;
use super::middleware::{jwt_auth_middleware, AuthenticatedAccount};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub number: i64,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub number: i64,
    pub token: String,
}

impl From<SessionResult> for SessionResponse {
    fn from(result: SessionResult) -> Self {
        Self {
            number: result.number,
            token: result.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: i64,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_account: i64,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub number: i64,
    pub old_balance: i64,
    pub new_balance: i64,
    pub to_account: i64,
    pub to_old_balance: i64,
    pub to_new_balance: i64,
}

impl From<TransferResult> for TransferResponse {
    fn from(result: TransferResult) -> Self {
        Self {
            number: result.from.number,
            old_balance: result.from.old_balance,
            new_balance: result.from.new_balance,
            to_account: result.to.number,
            to_old_balance: result.to.old_balance,
            to_new_balance: result.to.new_balance,
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API routes
///
/// Routes under `/:id` require a session token issued for that account.
pub fn create_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/account", get(list_accounts).post(create_account));

    let protected = Router::new()
        .route("/account/:id", get(get_account).delete(delete_account))
        .route("/deposit/:id", post(deposit))
        .route("/withdraw/:id", post(withdraw))
        .route("/transfer/:id", post(transfer))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    public.merge(protected)
}

async fn root() -> &'static str {
    "Hello there from server!!"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// =========================================================================
// Accounts
// =========================================================================

/// Exchange account number and password for a session token
async fn login(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let handler = LoginHandler::new(state.store, state.jwt);

    let result = handler
        .execute(LoginCommand::new(request.number, request.password), &context)
        .await?;

    Ok(Json(result.into()))
}

/// List all accounts
async fn list_accounts(State(state): State<AppState>) -> AppResult<Json<Vec<Account>>> {
    Ok(Json(state.store.list().await?))
}

/// Open a new account and log it in
async fn create_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let handler = CreateAccountHandler::new(state.store, state.jwt);

    let command =
        CreateAccountCommand::new(request.first_name, request.last_name, request.password);
    let result = handler.execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

async fn get_account(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedAccount>,
) -> AppResult<Json<Account>> {
    Ok(Json(state.store.get(acting.id).await?))
}

async fn delete_account(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedAccount>,
    Extension(context): Extension<OperationContext>,
) -> AppResult<Json<DeletedResponse>> {
    let handler = DeleteAccountHandler::new(state.store);

    let deleted = handler
        .execute(DeleteAccountCommand::new(acting.id), &context)
        .await?;

    Ok(Json(DeletedResponse { deleted }))
}

// =========================================================================
// Balance operations
// =========================================================================

async fn deposit(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedAccount>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<AmountRequest>,
) -> AppResult<Json<BalanceChange>> {
    let handler = DepositHandler::new(state.store);

    let change = handler
        .execute(DepositCommand::new(acting.number, request.amount), &context)
        .await?;

    Ok(Json(change))
}

async fn withdraw(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedAccount>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<AmountRequest>,
) -> AppResult<Json<BalanceChange>> {
    let handler = WithdrawHandler::new(state.store);

    let change = handler
        .execute(WithdrawCommand::new(acting.number, request.amount), &context)
        .await?;

    Ok(Json(change))
}

async fn transfer(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedAccount>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<TransferRequest>,
) -> AppResult<Json<TransferResponse>> {
    let handler = TransferHandler::new(state.store);

    let command = TransferCommand::new(acting.number, request.to_account, request.amount);
    let result = handler.execute(command, &context).await?;

    Ok(Json(result.into()))
}
