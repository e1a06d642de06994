//! Storage abstraction for audience lookups.
//!
//! The dispatcher never writes users, tokens or preferences; stores only
//! need to answer two read queries.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::postgres::PostgresPoolError;

use super::types::{DeviceToken, NotificationPreference, RecipientScope};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Backend is temporarily unavailable (e.g., circuit breaker open)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<PostgresPoolError> for StoreError {
    fn from(e: PostgresPoolError) -> Self {
        match e {
            PostgresPoolError::Sqlx(e) => StoreError::Postgres(e),
            PostgresPoolError::CircuitOpen => {
                StoreError::Unavailable("database circuit breaker is open".to_string())
            }
        }
    }
}

#[async_trait]
pub trait AudienceStore: Send + Sync {
    /// Active tokens of users in `scope.school_id`, narrowed by the scope's
    /// role and recipient allow-list.
    async fn candidate_tokens(&self, scope: &RecipientScope) -> Result<Vec<DeviceToken>, StoreError>;

    /// Preference records for the given users. Users without a record are
    /// simply absent from the map.
    async fn preferences(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, NotificationPreference>, StoreError>;

    /// Backend identifier for logs and health output
    fn backend_name(&self) -> &'static str;
}
