//! Prometheus metrics for the push dispatch engine.
//!
//! - Dispatch metrics (calls by category and mode, audience sizes)
//! - Gateway metrics (tickets by outcome, transport failures, call latency)
//! - Queue metrics (jobs persisted, persistence failures)
//! - Storage health (resolution failures, circuit breaker state)

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics, GatewayMetrics, QueueMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "push";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Dispatch calls by category and mode (immediate / queued)
    pub static ref DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Total dispatch calls",
        &["category", "mode"]
    ).unwrap();

    /// Device tokens resolved across all dispatches
    pub static ref TOKENS_RESOLVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_tokens_resolved_total", METRIC_PREFIX),
        "Total device tokens resolved as eligible recipients"
    ).unwrap();

    /// Dispatches whose audience resolved to nobody
    pub static ref EMPTY_AUDIENCE_TOTAL: IntCounter = register_int_counter!(
        format!("{}_empty_audience_total", METRIC_PREFIX),
        "Total dispatches skipped because no token was eligible"
    ).unwrap();

    /// Audience store read failures absorbed as empty audiences
    pub static ref RESOLUTION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_resolution_failures_total", METRIC_PREFIX),
        "Total audience resolution failures"
    ).unwrap();

    // ============================================================================
    // Gateway Metrics
    // ============================================================================

    /// Per-token tickets by outcome (ok / failed)
    pub static ref TICKETS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_tickets_total", METRIC_PREFIX),
        "Total per-token delivery outcomes",
        &["outcome"]
    ).unwrap();

    /// Gateway calls that failed as a whole (transport, timeout, bad response)
    pub static ref BATCH_TRANSPORT_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_batch_transport_failures_total", METRIC_PREFIX),
        "Total gateway batch calls that failed outright"
    ).unwrap();

    /// Gateway batch call latency
    pub static ref GATEWAY_CALL_LATENCY: Histogram = register_histogram!(
        format!("{}_gateway_call_latency_seconds", METRIC_PREFIX),
        "Push gateway batch call latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Queue Metrics
    // ============================================================================

    /// Deferred jobs persisted
    pub static ref JOBS_QUEUED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_jobs_queued_total", METRIC_PREFIX),
        "Total deferred dispatch jobs persisted"
    ).unwrap();

    /// Deferred job inserts that failed
    pub static ref PERSISTENCE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_persistence_failures_total", METRIC_PREFIX),
        "Total deferred job inserts that failed"
    ).unwrap();

    // ============================================================================
    // Storage Metrics
    // ============================================================================

    /// Database circuit breaker state (0=closed, 1=open, 2=half-open)
    pub static ref DATABASE_CIRCUIT_BREAKER_STATE: IntGauge = register_int_gauge!(
        format!("{}_database_circuit_breaker_state", METRIC_PREFIX),
        "Database circuit breaker state (0=closed, 1=open, 2=half-open)"
    ).unwrap();
}
