//! Circuit breaker guarding PostgreSQL reads and writes.
//!
//! A dead database should fail dispatches fast rather than stall every
//! audience lookup on the pool's acquire timeout. The breaker opens after
//! `failure_threshold` consecutive failures, rejects calls for
//! `reset_timeout_ms`, then lets probe calls through (half-open) until
//! `success_threshold` of them succeed.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// Sentinel for "not open"
const CLOSED: i64 = 0;

fn current_time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Numeric encoding used by the circuit breaker gauge.
    pub fn as_gauge(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
        }
    }
}

pub struct CircuitBreaker {
    /// Consecutive failures while closed
    failures: AtomicU32,
    /// Consecutive successful probes while half-open
    probes_ok: AtomicU32,
    /// When the breaker last opened (ms since epoch), `CLOSED` otherwise
    opened_at_ms: AtomicI64,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            failures: AtomicU32::new(0),
            probes_ok: AtomicU32::new(0),
            opened_at_ms: AtomicI64::new(CLOSED),
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        let opened_at = self.opened_at_ms.load(Ordering::Acquire);
        if opened_at == CLOSED {
            CircuitState::Closed
        } else if current_time_ms() - opened_at >= self.config.reset_timeout_ms as i64 {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }

    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => self.failures.store(0, Ordering::Release),
            CircuitState::HalfOpen => {
                let ok = self.probes_ok.fetch_add(1, Ordering::AcqRel) + 1;
                if ok >= self.config.success_threshold {
                    self.close();
                    tracing::info!("Database circuit breaker closed after recovery");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        match self.state() {
            CircuitState::Closed => {
                let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold {
                    self.open();
                    tracing::warn!(failures, "Database circuit breaker opened");
                }
            }
            CircuitState::HalfOpen => {
                self.open();
                tracing::warn!("Database circuit breaker reopened after failed probe");
            }
            CircuitState::Open => self.open(),
        }
    }

    fn open(&self) {
        self.probes_ok.store(0, Ordering::Release);
        self.opened_at_ms.store(current_time_ms(), Ordering::Release);
    }

    fn close(&self) {
        self.failures.store(0, Ordering::Release);
        self.probes_ok.store(0, Ordering::Release);
        self.opened_at_ms.store(CLOSED, Ordering::Release);
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state(),
            failure_count: self.failures.load(Ordering::Acquire),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn breaker(failure_threshold: u32, reset_timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold,
            success_threshold: 2,
            reset_timeout_ms,
        })
    }

    #[test]
    fn test_starts_closed() {
        let cb = CircuitBreaker::new();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(3, 10_000);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let cb = breaker(3, 10_000);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_then_closed() {
        let cb = breaker(1, 10);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.allow_request());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_failed_probe_reopens() {
        let cb = breaker(1, 10);
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(CircuitState::HalfOpen.as_str(), "half_open");
        assert_eq!(CircuitState::Open.as_gauge(), 1);
    }
}
