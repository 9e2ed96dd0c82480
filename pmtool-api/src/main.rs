//! # pmtool API Server
//!
//! Serves the multi-tenant project management engine over HTTP.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - One operation endpoint (`POST /v1/operations`) for organizations,
//!   projects, tasks and comments
//! - Tenant resolution from the organization header
//! - PostgreSQL storage, or an in-memory store when `DATABASE_URL` is unset
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p pmtool-api
//! ```

use pmtool_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use pmtool_shared::db::{
    migrations::{ensure_database_exists, run_migrations},
    pool::{close_pool, create_pool, DatabaseConfig},
};
use pmtool_shared::store::{memory::MemoryStore, postgres::PgStore, EntityStore};
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        "pmtool API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let (store, pool): (Arc<dyn EntityStore>, Option<PgPool>) = match &config.database {
        Some(database) => {
            ensure_database_exists(&database.url).await?;
            let pool = create_pool(DatabaseConfig {
                url: database.url.clone(),
                max_connections: database.max_connections,
                ..Default::default()
            })
            .await?;
            run_migrations(&pool).await?;
            let store: Arc<dyn EntityStore> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pmtool_api=debug,pmtool_shared=debug,tower_http=debug".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
