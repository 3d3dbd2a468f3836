//! bank_api - Bank account management API
//!
//! Accounts, session tokens, deposits, withdrawals and transfers over a
//! ledger store that serializes every balance change.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use bank_api::api::{self, AppState};
use bank_api::auth::JwtKeys;
use bank_api::{db, telemetry};
use bank_api::{Config, InMemoryLedgerStore, LedgerStore, PgLedgerStore, StoreBackend};

/// Open the configured ledger store, returning the pool when there is one
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn LedgerStore>, Option<PgPool>)> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory ledger store; balances are lost on exit");
            Ok((Arc::new(InMemoryLedgerStore::new(config.store_timeout)), None))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;

            tracing::info!("Connecting to database...");

            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(config.store_timeout)
                .connect(database_url)
                .await?;

            db::verify_connection(&pool).await?;
            db::init_schema(&pool).await?;

            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }

            tracing::info!("Database connected successfully");

            let store = PgLedgerStore::new(pool.clone(), config.store_timeout);
            Ok((Arc::new(store), Some(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    telemetry::init_tracing(config.is_production());

    tracing::info!(?config, "Starting bank_api server");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let (store, pool) = open_store(&config).await?;
    tracing::info!(backend = store.backend(), "Ledger store ready");

    let state = AppState::new(store, JwtKeys::new(&config.jwt_secret, config.jwt_ttl_seconds));
    let app = api::create_router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutting down...");
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
