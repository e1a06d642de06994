//! Queued job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::{DispatchMessage, NotificationCategory};

/// Lifecycle of a queued job.
///
/// Only `Pending` is written here. The delivery worker moves jobs through
/// the other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Sent,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
        }
    }
}

/// Insert payload for a deferred dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQueuedJob {
    /// Resolved at queue time; the worker does not re-resolve the audience
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub category: NotificationCategory,
    pub school_id: String,
    pub scheduled_for: DateTime<Utc>,
}

impl NewQueuedJob {
    pub fn new(
        tokens: Vec<String>,
        message: &DispatchMessage,
        category: NotificationCategory,
        school_id: impl Into<String>,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        Self {
            tokens,
            title: message.title.clone(),
            body: message.body.clone(),
            data: message.data.clone(),
            category,
            school_id: school_id.into(),
            scheduled_for,
        }
    }
}

/// A stored job row, including the columns owned by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: Uuid,
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub category: NotificationCategory,
    pub school_id: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: JobStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl QueuedJob {
    /// A freshly inserted job: pending, never attempted.
    pub fn pending(id: Uuid, job: NewQueuedJob) -> Self {
        Self {
            id,
            tokens: job.tokens,
            title: job.title,
            body: job.body,
            data: job.data,
            category: job.category,
            school_id: job.school_id,
            scheduled_for: job.scheduled_for,
            status: JobStatus::Pending,
            attempts: 0,
            created_at: Utc::now(),
            last_attempt_at: None,
            sent_at: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_job_starts_clean() {
        let message = DispatchMessage::new("Trip", "Bus leaves at 8");
        let new_job = NewQueuedJob::new(
            vec!["tok".to_string()],
            &message,
            NotificationCategory::Events,
            "s1",
            Utc::now(),
        );
        let job = QueuedJob::pending(Uuid::new_v4(), new_job);

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert!(job.last_attempt_at.is_none());
        assert_eq!(job.status.as_str(), "pending");
    }
}
