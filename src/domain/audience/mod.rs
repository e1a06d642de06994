//! Audience resolution.
//!
//! Turns a recipient scope and a notification category into the set of
//! device tokens that should receive the message.
//!
//! # Store backends
//!
//! - `MemoryAudienceStore`: in-process DashMap storage
//! - `PostgresAudienceStore`: reads `users`, `push_tokens` and
//!   `notification_preferences`
//!
//! Use `create_audience_store()` to pick one from configuration.

mod memory_store;
mod postgres_store;
mod resolver;
mod store;
mod types;

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::postgres::PostgresPool;

pub use memory_store::MemoryAudienceStore;
pub use postgres_store::PostgresAudienceStore;
pub use resolver::{is_eligible, AudienceResolver, Resolution, ResolutionError};
pub use store::{AudienceStore, StoreError};
pub use types::{DeviceToken, NotificationPreference, Platform, RecipientScope};

/// Create an audience store based on configuration.
///
/// - `"postgres"`: `PostgresAudienceStore` if a pool is provided
/// - `"memory"` (or postgres without a pool): `MemoryAudienceStore`
pub fn create_audience_store(
    settings: &DispatchConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Arc<dyn AudienceStore> {
    match settings.store_backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL audience store");
                Arc::new(PostgresAudienceStore::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL audience store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryAudienceStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory audience store");
            Arc::new(MemoryAudienceStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_falls_back_to_memory() {
        let settings = DispatchConfig::default();
        let store = create_audience_store(&settings, None);
        assert_eq!(store.backend_name(), "memory");
    }
}
