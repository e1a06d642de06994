//! Storage abstraction for queued jobs.
//!
//! The dispatcher only inserts. Reading, claiming and updating jobs belongs
//! to the delivery worker, so the trait deliberately has a single write.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::postgres::PostgresPoolError;

use super::models::NewQueuedJob;

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend is temporarily unavailable (e.g., circuit breaker open)
    #[error("Job store unavailable: {0}")]
    Unavailable(String),
}

impl From<PostgresPoolError> for JobStoreError {
    fn from(e: PostgresPoolError) -> Self {
        match e {
            PostgresPoolError::Sqlx(e) => JobStoreError::Postgres(e),
            PostgresPoolError::CircuitOpen => {
                JobStoreError::Unavailable("database circuit breaker is open".to_string())
            }
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a pending job with zero attempts and return its id.
    async fn insert(&self, job: NewQueuedJob) -> Result<Uuid, JobStoreError>;

    fn backend_name(&self) -> &'static str;
}
