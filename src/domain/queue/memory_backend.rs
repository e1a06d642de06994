//! In-memory job store using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::backend::{JobStore, JobStoreError};
use super::models::{NewQueuedJob, QueuedJob};

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: DashMap<Uuid, QueuedJob>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<QueuedJob> {
        self.jobs.get(id).map(|job| job.clone())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: NewQueuedJob) -> Result<Uuid, JobStoreError> {
        let id = Uuid::new_v4();
        self.jobs.insert(id, QueuedJob::pending(id, job));
        tracing::trace!(job_id = %id, "Job stored in memory");
        Ok(id)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::notification::{DispatchMessage, NotificationCategory};
    use crate::queue::JobStatus;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryJobStore::new();
        assert!(store.is_empty());

        let scheduled_for = Utc::now();
        let job = NewQueuedJob::new(
            vec!["a".to_string(), "b".to_string()],
            &DispatchMessage::new("Reminder", "Fees due"),
            NotificationCategory::Reminders,
            "s1",
            scheduled_for,
        );
        let id = store.insert(job).await.unwrap();

        let stored = store.get(&id).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(stored.tokens, vec!["a", "b"]);
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(stored.scheduled_for, scheduled_for);
    }
}
