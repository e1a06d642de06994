// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Domain layer (dispatch engine)
pub mod domain;

pub use domain::audience;
pub use domain::batch;
pub use domain::dispatch;
pub use domain::gateway;
pub use domain::notification;
pub use domain::queue;

// Application layer (operator surface)
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;
