//! Infrastructure layer modules
//!
//! Shared components:
//! - `config`: Application configuration and settings
//! - `error`: Operator API error type
//! - `metrics`: Prometheus metrics helpers
//! - `postgres`: PostgreSQL connection pool and circuit breaker

pub mod config;
pub mod error;
pub mod metrics;
pub mod postgres;
