use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::audience::{AudienceResolver, AudienceStore, Resolution};
use crate::batch::{BatchConfig, BatchSender};
use crate::config::Settings;
use crate::gateway::PushGateway;
use crate::metrics::{DispatchMetrics, QueueMetrics};
use crate::notification::DispatchResult;
use crate::queue::{JobStore, NewQueuedJob};

use super::error::DispatchError;
use super::request::{MessageDefaults, PushRequest};

/// Statistics for the dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Dispatches through the immediate path
    pub immediate_dispatches: AtomicU64,
    /// Dispatches through the queue path
    pub queued_dispatches: AtomicU64,
    /// Tokens resolved across all dispatches
    pub tokens_resolved: AtomicU64,
    /// Dispatches whose audience resolved to nobody
    pub empty_audiences: AtomicU64,
    /// Audience lookups that failed and degraded to nobody
    pub resolution_failures: AtomicU64,
    pub tokens_sent: AtomicU64,
    pub tokens_failed: AtomicU64,
    pub jobs_queued: AtomicU64,
    pub persistence_failures: AtomicU64,
    pub invalid_requests: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            immediate_dispatches: self.immediate_dispatches.load(Ordering::Relaxed),
            queued_dispatches: self.queued_dispatches.load(Ordering::Relaxed),
            tokens_resolved: self.tokens_resolved.load(Ordering::Relaxed),
            empty_audiences: self.empty_audiences.load(Ordering::Relaxed),
            resolution_failures: self.resolution_failures.load(Ordering::Relaxed),
            tokens_sent: self.tokens_sent.load(Ordering::Relaxed),
            tokens_failed: self.tokens_failed.load(Ordering::Relaxed),
            jobs_queued: self.jobs_queued.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub immediate_dispatches: u64,
    pub queued_dispatches: u64,
    pub tokens_resolved: u64,
    pub empty_audiences: u64,
    pub resolution_failures: u64,
    pub tokens_sent: u64,
    pub tokens_failed: u64,
    pub jobs_queued: u64,
    pub persistence_failures: u64,
    pub invalid_requests: u64,
}

/// Outcome of `queue_for_later`.
///
/// `queue_id` is `None` when the audience was empty and nothing was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueReceipt {
    pub queue_id: Option<Uuid>,
    pub token_count: usize,
}

impl QueueReceipt {
    pub fn is_queued(&self) -> bool {
        self.queue_id.is_some()
    }
}

/// Entry point for sending push notifications.
///
/// Both paths share audience resolution. `send_now` delivers through the
/// batch sender; `queue_for_later` stores a job for the delivery worker.
pub struct NotificationDispatcher {
    resolver: AudienceResolver,
    sender: BatchSender,
    job_store: Arc<dyn JobStore>,
    defaults: MessageDefaults,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(
        audience_store: Arc<dyn AudienceStore>,
        gateway: Arc<dyn PushGateway>,
        job_store: Arc<dyn JobStore>,
        batch_config: BatchConfig,
    ) -> Self {
        Self {
            resolver: AudienceResolver::new(audience_store),
            sender: BatchSender::new(gateway, batch_config),
            job_store,
            defaults: MessageDefaults::default(),
            stats: DispatcherStats::default(),
        }
    }

    /// Create a dispatcher with batch and message settings from configuration
    pub fn from_settings(
        settings: &Settings,
        audience_store: Arc<dyn AudienceStore>,
        gateway: Arc<dyn PushGateway>,
        job_store: Arc<dyn JobStore>,
    ) -> Self {
        Self::new(
            audience_store,
            gateway,
            job_store,
            BatchConfig::from(&settings.gateway),
        )
        .with_message_defaults(MessageDefaults {
            priority: settings.dispatch.default_priority,
            sound: settings.dispatch.default_sound.clone(),
        })
    }

    pub fn with_message_defaults(mut self, defaults: MessageDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn audience_backend(&self) -> &'static str {
        self.resolver.store().backend_name()
    }

    pub fn queue_backend(&self) -> &'static str {
        self.job_store.backend_name()
    }

    pub fn gateway_name(&self) -> &'static str {
        self.sender.gateway_name()
    }

    /// Resolve the audience and deliver immediately.
    ///
    /// Only an invalid request is an error. A failed audience lookup or a
    /// failed gateway call shows up as counts in the returned result.
    #[tracing::instrument(
        name = "dispatcher.send_now",
        skip(self, request),
        fields(school_id = %request.school_id, category = %request.category)
    )]
    pub async fn send_now(&self, request: PushRequest) -> Result<DispatchResult, DispatchError> {
        self.validate(&request)?;
        self.stats.immediate_dispatches.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::record_immediate(request.category);

        let resolution = self.resolve(&request).await;
        if resolution.is_empty() {
            tracing::debug!("No eligible recipients, nothing to send");
            return Ok(DispatchResult::empty());
        }

        let message = request.message(&self.defaults);
        let result = self.sender.send_batches(&resolution.tokens, &message).await;

        self.stats.tokens_sent.fetch_add(result.sent as u64, Ordering::Relaxed);
        self.stats.tokens_failed.fetch_add(result.failed as u64, Ordering::Relaxed);

        if result.success {
            tracing::info!(sent = result.sent, failed = result.failed, "Push notification sent");
        } else {
            tracing::warn!(sent = result.sent, failed = result.failed, "Push notification failed for every token");
        }

        Ok(result)
    }

    /// Same as [`send_now`](Self::send_now).
    pub async fn send_immediate(&self, request: PushRequest) -> Result<DispatchResult, DispatchError> {
        self.send_now(request).await
    }

    /// Resolve the audience now and store a pending job for later delivery.
    ///
    /// `scheduled_for` defaults to now. An empty audience stores nothing.
    /// A failed write is returned as `DispatchError::Persistence`.
    #[tracing::instrument(
        name = "dispatcher.queue_for_later",
        skip(self, request),
        fields(school_id = %request.school_id, category = %request.category)
    )]
    pub async fn queue_for_later(
        &self,
        request: PushRequest,
        scheduled_for: Option<DateTime<Utc>>,
    ) -> Result<QueueReceipt, DispatchError> {
        self.validate(&request)?;
        self.stats.queued_dispatches.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::record_queued(request.category);

        let resolution = self.resolve(&request).await;
        if resolution.is_empty() {
            tracing::debug!("No eligible recipients, nothing to queue");
            return Ok(QueueReceipt {
                queue_id: None,
                token_count: 0,
            });
        }

        let token_count = resolution.tokens.len();
        let message = request.message(&self.defaults);
        let job = NewQueuedJob::new(
            resolution.tokens,
            &message,
            request.category,
            request.school_id.clone(),
            scheduled_for.unwrap_or_else(Utc::now),
        );

        match self.job_store.insert(job).await {
            Ok(id) => {
                self.stats.jobs_queued.fetch_add(1, Ordering::Relaxed);
                QueueMetrics::record_job_queued();
                tracing::info!(job_id = %id, token_count = token_count, "Push notification queued");
                Ok(QueueReceipt {
                    queue_id: Some(id),
                    token_count,
                })
            }
            Err(e) => {
                self.stats.persistence_failures.fetch_add(1, Ordering::Relaxed);
                QueueMetrics::record_persistence_failure();
                tracing::error!(
                    backend = self.job_store.backend_name(),
                    token_count = token_count,
                    error = %e,
                    "Failed to queue push notification"
                );
                Err(DispatchError::Persistence(e))
            }
        }
    }

    fn validate(&self, request: &PushRequest) -> Result<(), DispatchError> {
        request.validate().inspect_err(|e| {
            self.stats.invalid_requests.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "Rejected push request");
        })
    }

    async fn resolve(&self, request: &PushRequest) -> Resolution {
        let resolution = self
            .resolver
            .resolve_best_effort(&request.scope(), request.category)
            .await;

        if resolution.failure.is_some() {
            self.stats.resolution_failures.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_resolution_failure();
        }
        if resolution.is_empty() {
            self.stats.empty_audiences.fetch_add(1, Ordering::Relaxed);
        }
        self.stats
            .tokens_resolved
            .fetch_add(resolution.tokens.len() as u64, Ordering::Relaxed);
        DispatchMetrics::record_resolved(resolution.tokens.len());

        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    use crate::audience::{DeviceToken, MemoryAudienceStore, Platform};
    use crate::gateway::{GatewayError, PushMessage, PushTicket};
    use crate::notification::{NotificationCategory, Priority, RecipientRole};
    use crate::queue::{JobStoreError, MemoryJobStore};

    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicUsize,
        last_priority: std::sync::Mutex<Option<Priority>>,
    }

    #[async_trait]
    impl PushGateway for CountingGateway {
        async fn send_batch(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_priority.lock().unwrap() = messages.first().map(|m| m.priority);
            Ok(messages.iter().map(|m| PushTicket::ok(m.to.clone())).collect())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct BrokenJobStore;

    #[async_trait]
    impl JobStore for BrokenJobStore {
        async fn insert(&self, _job: NewQueuedJob) -> Result<Uuid, JobStoreError> {
            Err(JobStoreError::Unavailable("database circuit breaker is open".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn store() -> Arc<MemoryAudienceStore> {
        let store = Arc::new(MemoryAudienceStore::new());
        store.add_user("p1", "s1", RecipientRole::Parent);
        store.add_token(DeviceToken::active("p1", Platform::Ios, "tok-p1"));
        store
    }

    fn request() -> PushRequest {
        PushRequest::builder("s1", NotificationCategory::Announcements)
            .title("Holiday")
            .body("No school Friday")
            .build()
    }

    #[tokio::test]
    async fn test_send_now_updates_stats() {
        let gateway = Arc::new(CountingGateway::default());
        let dispatcher = NotificationDispatcher::new(
            store(),
            gateway.clone(),
            Arc::new(MemoryJobStore::new()),
            BatchConfig::default(),
        );

        let result = dispatcher.send_now(request()).await.unwrap();
        assert_eq!(result.sent, 1);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*gateway.last_priority.lock().unwrap(), Some(Priority::High));

        let stats = dispatcher.stats();
        assert_eq!(stats.immediate_dispatches, 1);
        assert_eq!(stats.tokens_resolved, 1);
        assert_eq!(stats.tokens_sent, 1);
    }

    #[tokio::test]
    async fn test_invalid_request_does_no_io() {
        let gateway = Arc::new(CountingGateway::default());
        let dispatcher = NotificationDispatcher::new(
            store(),
            gateway.clone(),
            Arc::new(MemoryJobStore::new()),
            BatchConfig::default(),
        );

        let mut bad = request();
        bad.title = String::new();
        let err = dispatcher.send_now(bad.clone()).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));
        let err = dispatcher.queue_for_later(bad, None).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        let stats = dispatcher.stats();
        assert_eq!(stats.invalid_requests, 2);
        assert_eq!(stats.immediate_dispatches, 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_returned() {
        let dispatcher = NotificationDispatcher::new(
            store(),
            Arc::new(CountingGateway::default()),
            Arc::new(BrokenJobStore),
            BatchConfig::default(),
        );

        let err = dispatcher.queue_for_later(request(), None).await.unwrap_err();
        assert!(matches!(err, DispatchError::Persistence(JobStoreError::Unavailable(_))));
        assert_eq!(dispatcher.stats().persistence_failures, 1);
    }

    #[tokio::test]
    async fn test_message_defaults_from_settings() {
        let mut settings = Settings::default();
        settings.dispatch.default_priority = Priority::Default;
        let gateway = Arc::new(CountingGateway::default());
        let dispatcher = NotificationDispatcher::from_settings(
            &settings,
            store(),
            gateway.clone(),
            Arc::new(MemoryJobStore::new()),
        );

        dispatcher.send_now(request()).await.unwrap();
        assert_eq!(*gateway.last_priority.lock().unwrap(), Some(Priority::Default));
    }
}
