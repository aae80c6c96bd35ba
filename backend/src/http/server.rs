//! Axum server setup
//!
//! Builds the gateway from config, bootstraps the schema, then serves until
//! Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::{Backend, Config};
use crate::db::{Gateway, MemoryGateway, RedisGateway};
use crate::repo::TASK_COLLECTION;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<dyn Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }
}

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the gateway selected by `config`.
pub fn open_gateway(config: &Config) -> Result<Arc<dyn Gateway>> {
    let gateway: Arc<dyn Gateway> = match config.backend {
        Backend::Redis => Arc::new(
            RedisGateway::open(&config.redis_url(), config.db_name.clone())
                .context("invalid database address")?,
        ),
        Backend::Memory => {
            tracing::warn!("using the in-memory store; tasks are lost on exit");
            Arc::new(MemoryGateway::new(config.db_name.clone()))
        }
    };
    Ok(gateway)
}

/// Create the database and task collection if needed. Fails on anything
/// other than "already exists".
pub async fn bootstrap(gateway: &dyn Gateway) -> Result<()> {
    let outcome = gateway
        .bootstrap(TASK_COLLECTION)
        .await
        .context("database bootstrap failed")?;

    if outcome.already_existed() {
        tracing::info!("Database already exists.");
    } else {
        tracing::info!(
            database_created = outcome.database_created,
            collection_created = outcome.collection_created,
            "Database setup completed."
        );
    }
    Ok(())
}

/// Bootstrap, then run the HTTP server until shutdown.
pub async fn serve(config: Config) -> Result<()> {
    let gateway = open_gateway(&config)?;
    bootstrap(gateway.as_ref()).await?;

    let app = build_router(AppState::new(gateway));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("Server listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
