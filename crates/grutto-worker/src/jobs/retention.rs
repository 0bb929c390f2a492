//! Notification retention sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing;

use grutto_service::NotificationService;

use crate::executor::{JobExecutionError, JobHandler};

/// Deletes notifications past the retention window for every recipient.
///
/// Listing a panel already sweeps that recipient's rows; this job covers
/// recipients who never open theirs.
#[derive(Debug, Clone)]
pub struct NotificationRetentionJob {
    /// Notification service
    notifications: NotificationService,
}

impl NotificationRetentionJob {
    /// Job type name.
    pub const JOB_TYPE: &'static str = "notification_retention";

    /// Create a new retention job
    pub fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl JobHandler for NotificationRetentionJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<Value, JobExecutionError> {
        let cutoff = self.notifications.retention_cutoff(now);
        let removed = self
            .notifications
            .sweep_expired(now)
            .await
            .map_err(|e| JobExecutionError::from_app_error("Notification sweep failed", e))?;

        tracing::info!(removed, cutoff = %cutoff, "Notification retention sweep finished");

        Ok(serde_json::json!({
            "task": Self::JOB_TYPE,
            "removed": removed,
            "cutoff": cutoff.to_rfc3339(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use grutto_core::config::NotificationConfig;
    use grutto_database::MemoryDatabase;
    use grutto_database::traits::NotificationStore;
    use grutto_entity::notification::CreateNotification;
    use grutto_service::RetryPolicy;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_sweeps_only_expired_rows() {
        let db = Arc::new(MemoryDatabase::new());
        let service = NotificationService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            NotificationConfig::default(),
            RetryPolicy::none(),
        );
        let job = NotificationRetentionJob::new(service);

        let owner = Uuid::new_v4();
        let old = db
            .create(&CreateNotification::folder_deleted(owner, "Archive"))
            .await
            .unwrap();
        let fresh = db
            .create(&CreateNotification::folder_deleted(owner, "Current"))
            .await
            .unwrap();
        let now = Utc::now();
        db.set_notification_created_at(old.id, now - Duration::days(30) - Duration::minutes(1));

        let summary = job.execute(now).await.unwrap();
        assert_eq!(summary["removed"], 1);
        assert!(NotificationStore::find_by_id(db.as_ref(), old.id).await.unwrap().is_none());
        assert!(NotificationStore::find_by_id(db.as_ref(), fresh.id).await.unwrap().is_some());

        let again = job.execute(now).await.unwrap();
        assert_eq!(again["removed"], 0);
    }
}
