//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::dispatch::DispatcherStatsSnapshot;
use crate::postgres::CircuitState;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub dispatch: DispatchHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub status: String,
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct DispatchHealthResponse {
    pub audience_backend: String,
    pub queue_backend: String,
    pub gateway: String,
    pub batch_size: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub dispatch: DispatcherStatsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseStats>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    pub circuit_breaker_state: String,
    pub circuit_breaker_failures: u32,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let postgres = state.postgres_pool.as_ref().map(|pool| {
        let breaker = pool.circuit_breaker().state();
        let inner_pool = pool.pool();
        PostgresHealthResponse {
            status: breaker.as_str().to_string(),
            connected: pool.is_available(),
            pool_size: inner_pool.size(),
            idle_connections: inner_pool.num_idle() as u32,
        }
    });

    let degraded = postgres.as_ref().is_some_and(|pg| !pg.connected);
    let status = if degraded { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        postgres,
        dispatch: DispatchHealthResponse {
            audience_backend: state.dispatcher.audience_backend().to_string(),
            queue_backend: state.dispatcher.queue_backend().to_string(),
            gateway: state.dispatcher.gateway_name().to_string(),
            batch_size: state.settings.gateway.batch_size,
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let database = state.postgres_pool.as_ref().map(|pool| {
        let breaker = pool.circuit_breaker().stats();
        DatabaseStats {
            circuit_breaker_state: breaker.state.as_str().to_string(),
            circuit_breaker_failures: breaker.failure_count,
        }
    });

    Json(StatsResponse {
        dispatch: state.dispatcher.stats(),
        database,
    })
}

/// Circuit state for the metrics gauge; closed when there is no database.
pub(super) fn database_circuit_state(state: &AppState) -> CircuitState {
    state
        .postgres_pool
        .as_ref()
        .map(|pool| pool.circuit_breaker().state())
        .unwrap_or(CircuitState::Closed)
}
