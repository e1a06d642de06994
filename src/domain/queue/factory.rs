use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::postgres::PostgresPool;

use super::backend::JobStore;
use super::memory_backend::MemoryJobStore;
use super::postgres_backend::PostgresJobStore;

/// Create a job store based on configuration.
///
/// - `"postgres"`: `PostgresJobStore` if a pool is provided
/// - `"memory"` (or postgres without a pool): `MemoryJobStore`
pub fn create_job_store(
    settings: &DispatchConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Arc<dyn JobStore> {
    match settings.queue_backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL job store");
                Arc::new(PostgresJobStore::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL job store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryJobStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory job store");
            Arc::new(MemoryJobStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend() {
        let settings = DispatchConfig {
            queue_backend: "memory".to_string(),
            ..DispatchConfig::default()
        };
        assert_eq!(create_job_store(&settings, None).backend_name(), "memory");
    }

    #[test]
    fn test_postgres_without_pool_falls_back() {
        let settings = DispatchConfig::default();
        assert_eq!(settings.queue_backend, "postgres");
        assert_eq!(create_job_store(&settings, None).backend_name(), "memory");
    }
}
