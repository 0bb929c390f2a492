//! Notification listing, read state and retention.
//!
//! Notifications live for `retention_days`. Expired rows of a recipient
//! are swept the next time that recipient lists the panel; the worker
//! runs the same sweep for everyone on a schedule.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use grutto_core::config::NotificationConfig;
use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_database::traits::{FileStore, NotificationStore, ProfileStore};
use grutto_entity::notification::Notification;
use grutto_entity::profile::ProfileSummary;

use crate::context::RequestContext;
use crate::retry::RetryPolicy;

/// A notification with the names needed to render it.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEntry {
    /// The notification.
    #[serde(flatten)]
    pub notification: Notification,
    /// Who caused it.
    pub sender: Option<ProfileSummary>,
    /// Name of the referenced file, while it still exists.
    pub filename: Option<String>,
}

/// Manages a user's notifications.
#[derive(Clone)]
pub struct NotificationService {
    /// Notification store.
    notifications: Arc<dyn NotificationStore>,
    /// Profile store, for sender names.
    profiles: Arc<dyn ProfileStore>,
    /// File store, for file names.
    files: Arc<dyn FileStore>,
    /// Retention settings.
    config: NotificationConfig,
    /// Retry policy for reads.
    retry: RetryPolicy,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("config", &self.config)
            .finish()
    }
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        profiles: Arc<dyn ProfileStore>,
        files: Arc<dyn FileStore>,
        config: NotificationConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            notifications,
            profiles,
            files,
            config,
            retry,
        }
    }

    /// Oldest creation time still retained at `now`.
    pub fn retention_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.config.retention_days)
    }

    /// Lists the caller's notifications, newest first, after sweeping
    /// their expired ones.
    pub async fn list_notifications(
        &self,
        ctx: &RequestContext,
    ) -> AppResult<Vec<NotificationEntry>> {
        let cutoff = self.retention_cutoff(ctx.request_time);
        match self
            .notifications
            .delete_older_than(Some(ctx.user_id), cutoff)
            .await
        {
            Ok(0) => {}
            Ok(removed) => debug!(user_id = %ctx.user_id, removed, "Expired notifications swept"),
            Err(e) => warn!(user_id = %ctx.user_id, error = %e, "Notification sweep failed"),
        }

        let mut rows = self
            .retry
            .run("list_notifications", || {
                self.notifications.find_by_recipient(ctx.user_id)
            })
            .await?;
        // A failed sweep must not leak expired rows into the panel.
        rows.retain(|n| !n.is_expired(self.config.retention_days, ctx.request_time));
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut sender_ids: Vec<Uuid> = rows.iter().map(|n| n.sender_id).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();
        let mut file_ids: Vec<Uuid> = rows.iter().filter_map(|n| n.file_id).collect();
        file_ids.sort_unstable();
        file_ids.dedup();

        let senders: HashMap<Uuid, ProfileSummary> = self
            .retry
            .run("load_senders", || self.profiles.find_by_ids(&sender_ids))
            .await?
            .into_iter()
            .map(|p| (p.id, p.summary()))
            .collect();
        let filenames: HashMap<Uuid, String> = if file_ids.is_empty() {
            HashMap::new()
        } else {
            self.retry
                .run("load_files", || self.files.find_by_ids(&file_ids))
                .await?
                .into_iter()
                .map(|f| (f.id, f.filename))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|notification| NotificationEntry {
                sender: senders.get(&notification.sender_id).cloned(),
                filename: notification
                    .file_id
                    .and_then(|id| filenames.get(&id).cloned()),
                notification,
            })
            .collect())
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, ctx: &RequestContext) -> AppResult<i64> {
        self.retry
            .run("count_unread", || {
                self.notifications
                    .count_unread(ctx.user_id, self.retention_cutoff(ctx.request_time))
            })
            .await
    }

    /// Marks one of the caller's notifications as read.
    pub async fn mark_read(&self, ctx: &RequestContext, notification_id: Uuid) -> AppResult<()> {
        if !self
            .notifications
            .mark_read(notification_id, ctx.user_id)
            .await?
        {
            return Err(not_found(notification_id));
        }
        Ok(())
    }

    /// Marks all of the caller's notifications as read.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> AppResult<u64> {
        let changed = self.notifications.mark_all_read(ctx.user_id).await?;
        info!(user_id = %ctx.user_id, changed, "Notifications marked read");
        Ok(changed)
    }

    /// Deletes one of the caller's notifications.
    pub async fn delete(&self, ctx: &RequestContext, notification_id: Uuid) -> AppResult<()> {
        if !self
            .notifications
            .delete(notification_id, ctx.user_id)
            .await?
        {
            return Err(not_found(notification_id));
        }
        Ok(())
    }

    /// Deletes every notification past retention, for all recipients.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let removed = self
            .notifications
            .delete_older_than(None, self.retention_cutoff(now))
            .await?;
        if removed > 0 {
            info!(removed, "Expired notifications purged");
        }
        Ok(removed)
    }
}

fn not_found(notification_id: Uuid) -> AppError {
    AppError::not_found(format!("Notification {notification_id} not found"))
}
