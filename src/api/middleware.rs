//! API Middleware
//!
//! Session token authentication and request logging.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;

use super::AppState;

/// Header carrying the session token
pub const JWT_HEADER: &str = "x-jwt-token";

/// Header carrying the request id, set by `SetRequestIdLayer`
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Account the session token was verified against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub id: i64,
    pub number: i64,
}

// =========================================================================
// Session token authentication
// =========================================================================

/// Verify that the caller's token was issued for the account in the path
///
/// Runs as a route layer on `/:id` routes. A missing, malformed, expired or
/// foreign token and an unknown account all yield `Permission Denied`.
/// Store failures other than a missing account propagate as they are.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let id: i64 = id.parse().map_err(|_| AppError::PermissionDenied)?;

    let token = request
        .headers()
        .get(JWT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::PermissionDenied)?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Session token rejected");
        AppError::PermissionDenied
    })?;

    let account = match state.store.get(id).await {
        Ok(account) => account,
        Err(err) if err.is_not_found() => return Err(AppError::PermissionDenied),
        Err(err) => return Err(err.into()),
    };

    if claims.account_number != account.number {
        tracing::info!(
            account_id = id,
            token_account = claims.account_number,
            "Token does not belong to account"
        );
        return Err(AppError::PermissionDenied);
    }

    request.extensions_mut().insert(AuthenticatedAccount {
        id: account.id,
        number: account.number,
    });

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[JWT_HEADER, "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
///
/// Also builds the `OperationContext` every handler receives, using the
/// request id as correlation id when it is a UUID.
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let mut context = OperationContext::new().with_correlation_id(correlation_id);
    if let Some(ip) = client_ip {
        context = context.with_client_ip(ip);
    }
    request.extensions_mut().insert(context);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = %correlation_id,
        client_ip = ?client_ip,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    response
}
