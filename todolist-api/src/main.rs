//! # Todolist API Server
//!
//! Serves registration, login and the ownership-scoped lists / tasks /
//! subtasks API.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... DATABASE_URL=postgresql://... cargo run -p todolist-api
//! STORAGE_BACKEND=memory JWT_SECRET=... cargo run -p todolist-api
//! ```

use std::sync::Arc;

use todolist_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use todolist_shared::{
    db::{migrations::run_migrations, pool},
    store::{memory::InMemoryStore, postgres::PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todolist_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Todolist API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let store = open_store(&config).await?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let database = config
                .storage
                .database
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

            let pool = pool::create_pool(pool::DatabaseConfig {
                url: database.url.clone(),
                max_connections: database.max_connections,
                ..Default::default()
            })
            .await?;
            run_migrations(&pool).await?;

            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
