//! PostgreSQL connection pool with circuit breaker integration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

use super::CircuitBreaker;

#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Circuit breaker is open")]
    CircuitOpen,
}

/// PostgreSQL connection pool with circuit breaker integration.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
    circuit_breaker: Arc<CircuitBreaker>,
    database_url: String,
}

impl PostgresPool {
    /// Connect a new pool from configuration.
    pub async fn connect(
        config: &DatabaseConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, PostgresPoolError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds as u64))
            .connect(&config.url)
            .await?;

        let pool = Self::from_pool(pool, circuit_breaker, config.url.clone());
        tracing::info!(
            pool_size = config.pool_size,
            url = %pool.database_url_masked(),
            "PostgreSQL connection pool created"
        );
        Ok(pool)
    }

    /// Wrap an already-built pool (lazy pools in tests, shared pools in hosts).
    pub fn from_pool(pool: PgPool, circuit_breaker: Arc<CircuitBreaker>, database_url: String) -> Self {
        Self {
            pool,
            circuit_breaker,
            database_url,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Check if the circuit breaker allows operations.
    pub fn is_available(&self) -> bool {
        self.circuit_breaker.allow_request()
    }

    /// Run a query with circuit breaker protection.
    ///
    /// The closure receives an owned handle to the pool so the returned
    /// future does not borrow from `self`.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, PostgresPoolError>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        if !self.circuit_breaker.allow_request() {
            return Err(PostgresPoolError::CircuitOpen);
        }

        match operation(self.pool.clone()).await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                Err(PostgresPoolError::Sqlx(e))
            }
        }
    }

    /// Get the database URL with the password masked.
    pub fn database_url_masked(&self) -> String {
        mask_database_url(&self.database_url)
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // "postgres://" has a colon too; only mask when it sits after the scheme
            if !url[colon_pos..].starts_with("://") {
                return format!("{}***{}", &url[..colon_pos + 1], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        let masked = mask_database_url("postgres://campus:secret123@db:5432/campus");
        assert_eq!(masked, "postgres://campus:***@db:5432/campus");
        assert!(!masked.contains("secret123"));
    }

    #[test]
    fn test_mask_without_password() {
        let url = "postgres://localhost:5432/campus";
        assert_eq!(mask_database_url(url), url);

        let user_only = "postgres://campus@localhost/campus";
        assert_eq!(mask_database_url(user_only), user_only);
    }

    #[tokio::test]
    async fn test_open_breaker_short_circuits() {
        let pg = PgPoolOptions::new()
            .connect_lazy("postgres://campus:pw@localhost:1/campus")
            .unwrap();
        let breaker = Arc::new(CircuitBreaker::new());
        for _ in 0..5 {
            breaker.record_failure();
        }
        let pool = PostgresPool::from_pool(pg, breaker, "postgres://localhost:1/campus".into());

        let result = pool.execute(|_pool| async { Ok::<_, sqlx::Error>(1) }).await;
        assert!(matches!(result, Err(PostgresPoolError::CircuitOpen)));
    }
}
