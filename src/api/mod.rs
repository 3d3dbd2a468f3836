//! API module
//!
//! HTTP API endpoints and middleware.

pub mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::JwtKeys;
use crate::ledger::LedgerStore;

pub use middleware::AuthenticatedAccount;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, jwt: JwtKeys) -> Self {
        Self {
            store,
            jwt: Arc::new(jwt),
        }
    }
}

/// Build the application router with its middleware stack
///
/// Layers run outermost first: request id, tracing, request logging, then
/// the route (and the token check on protected routes).
pub fn create_router(state: AppState) -> Router {
    routes::create_routes(state.clone())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
