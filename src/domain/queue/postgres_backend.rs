//! PostgreSQL job store.
//!
//! Writes to `push_notification_queue`. The row is inserted in a single
//! statement; later status/attempt updates happen in the worker.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::postgres::PostgresPool;

use super::backend::{JobStore, JobStoreError};
use super::models::{JobStatus, NewQueuedJob};

pub struct PostgresJobStore {
    pool: Arc<PostgresPool>,
}

impl PostgresJobStore {
    pub fn new(pool: Arc<PostgresPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn insert(&self, job: NewQueuedJob) -> Result<Uuid, JobStoreError> {
        let data = serde_json::to_value(&job.data)?;

        let (id,): (Uuid,) = self
            .pool
            .execute(|pool| async move {
                sqlx::query_as(
                    r#"
                    INSERT INTO push_notification_queue
                        (tokens, title, body, data, notification_type, school_id,
                         scheduled_for, status, attempts)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)
                    RETURNING id
                    "#,
                )
                .bind(&job.tokens)
                .bind(&job.title)
                .bind(&job.body)
                .bind(&data)
                .bind(job.category.as_str())
                .bind(&job.school_id)
                .bind(job.scheduled_for)
                .bind(JobStatus::Pending.as_str())
                .fetch_one(&pool)
                .await
            })
            .await?;

        tracing::debug!(job_id = %id, "Push job inserted");
        Ok(id)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
