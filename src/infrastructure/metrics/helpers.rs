//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::notification::NotificationCategory;

use super::{
    BATCH_TRANSPORT_FAILURES_TOTAL, DISPATCHES_TOTAL, EMPTY_AUDIENCE_TOTAL, GATEWAY_CALL_LATENCY,
    JOBS_QUEUED_TOTAL, PERSISTENCE_FAILURES_TOTAL, RESOLUTION_FAILURES_TOTAL, TICKETS_TOTAL,
    TOKENS_RESOLVED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_immediate(category: NotificationCategory) {
        DISPATCHES_TOTAL
            .with_label_values(&[category.as_str(), "immediate"])
            .inc();
    }

    pub fn record_queued(category: NotificationCategory) {
        DISPATCHES_TOTAL
            .with_label_values(&[category.as_str(), "queued"])
            .inc();
    }

    pub fn record_resolved(count: usize) {
        if count == 0 {
            EMPTY_AUDIENCE_TOTAL.inc();
        } else {
            TOKENS_RESOLVED_TOTAL.inc_by(count as u64);
        }
    }

    pub fn record_resolution_failure() {
        RESOLUTION_FAILURES_TOTAL.inc();
    }
}

/// Helper struct for recording push gateway metrics
pub struct GatewayMetrics;

impl GatewayMetrics {
    pub fn record_tickets(ok: usize, failed: usize) {
        TICKETS_TOTAL.with_label_values(&["ok"]).inc_by(ok as u64);
        TICKETS_TOTAL
            .with_label_values(&["failed"])
            .inc_by(failed as u64);
    }

    pub fn record_transport_failure() {
        BATCH_TRANSPORT_FAILURES_TOTAL.inc();
    }

    pub fn record_latency(latency_secs: f64) {
        GATEWAY_CALL_LATENCY.observe(latency_secs);
    }
}

/// Helper struct for recording queue metrics
pub struct QueueMetrics;

impl QueueMetrics {
    pub fn record_job_queued() {
        JOBS_QUEUED_TOTAL.inc();
    }

    pub fn record_persistence_failure() {
        PERSISTENCE_FAILURES_TOTAL.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        DispatchMetrics::record_immediate(NotificationCategory::Grades);
        GatewayMetrics::record_tickets(3, 1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("push_dispatches_total"));
        assert!(output.contains("push_tickets_total"));
    }

    #[test]
    fn test_ticket_counters_increase() {
        let before = TICKETS_TOTAL.with_label_values(&["failed"]).get();
        GatewayMetrics::record_tickets(0, 2);
        let after = TICKETS_TOTAL.with_label_values(&["failed"]).get();
        assert!(after >= before + 2);
    }
}
