use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::dispatch::NotificationDispatcher;
use crate::postgres::PostgresPool;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub postgres_pool: Option<Arc<PostgresPool>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        dispatcher: Arc<NotificationDispatcher>,
        postgres_pool: Option<Arc<PostgresPool>>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            dispatcher,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
