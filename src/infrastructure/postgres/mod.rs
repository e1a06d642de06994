//! PostgreSQL persistence module.
//!
//! Provides the connection pool shared by the audience store and the job
//! store, guarded by a circuit breaker.

mod circuit_breaker;
pub mod pool;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use pool::{PostgresPool, PostgresPoolError};
