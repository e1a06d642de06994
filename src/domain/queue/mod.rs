//! Deferred dispatch jobs.
//!
//! The queue path persists one `QueuedJob` per dispatch for an external
//! worker to deliver later.
//!
//! # Backends
//!
//! - `MemoryJobStore`: in-memory storage using DashMap
//! - `PostgresJobStore`: the `push_notification_queue` table
//!
//! Use `create_job_store()` to pick one from configuration.

mod backend;
mod factory;
mod memory_backend;
mod models;
mod postgres_backend;

pub use backend::{JobStore, JobStoreError};
pub use factory::create_job_store;
pub use memory_backend::MemoryJobStore;
pub use models::{JobStatus, NewQueuedJob, QueuedJob};
pub use postgres_backend::PostgresJobStore;
