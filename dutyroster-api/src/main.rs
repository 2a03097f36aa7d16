//! # Dutyroster API Server
//!
//! HTTP server for hierarchical task assignment: admins hand out tasks to
//! the soldiers within their unit / depot / platoon / section scope, and
//! track them through completion and verification.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/dutyroster \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p dutyroster-api
//! ```

use dutyroster_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use dutyroster_shared::db::{
    migrations::{ensure_database_exists, run_migrations},
    pool::{close_pool, create_pool},
};
use dutyroster_shared::store::postgres::PgStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.api.log_format);

    tracing::info!(
        "Dutyroster API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if config.database.run_migrations {
        ensure_database_exists(&config.database.url).await?;
    }

    let pool = create_pool(config.pool_config()).await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "dutyroster_api=debug,dutyroster_shared=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
