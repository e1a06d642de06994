use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use campus_push_dispatch::audience::create_audience_store;
use campus_push_dispatch::config::Settings;
use campus_push_dispatch::dispatch::NotificationDispatcher;
use campus_push_dispatch::gateway::ExpoPushGateway;
use campus_push_dispatch::postgres::{CircuitBreaker, PostgresPool};
use campus_push_dispatch::queue::create_job_store;
use campus_push_dispatch::server::{create_app, AppState};
use campus_push_dispatch::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("failed to load configuration")?;

    let _telemetry = init_telemetry(&settings.logging, &settings.otel)?;
    tracing::info!("Configuration loaded");

    let postgres_pool = if settings.requires_postgres() {
        let pool = PostgresPool::connect(&settings.database, Arc::new(CircuitBreaker::new()))
            .await
            .context("failed to connect to PostgreSQL")?;
        Some(Arc::new(pool))
    } else {
        None
    };

    let audience_store = create_audience_store(&settings.dispatch, postgres_pool.clone());
    let job_store = create_job_store(&settings.dispatch, postgres_pool.clone());
    let gateway = Arc::new(ExpoPushGateway::new(&settings.gateway)?);
    tracing::info!(
        url = %gateway.url(),
        batch_size = settings.gateway.batch_size,
        max_concurrent_batches = settings.gateway.max_concurrent_batches,
        "Push gateway configured"
    );

    let dispatcher = Arc::new(NotificationDispatcher::from_settings(
        &settings,
        audience_store,
        gateway,
        job_store,
    ));

    let state = AppState::new(settings.clone(), dispatcher, postgres_pool.clone());
    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
