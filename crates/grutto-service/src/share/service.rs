//! Share grant service.
//!
//! Granting is owner-only and idempotent: a recipient who already holds a
//! grant, or who appears twice in one request, gets exactly one grant and
//! one notification. Notifications are best effort; a failed insert is
//! logged and never undoes the grant.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use grutto_core::config::SharingConfig;
use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_database::traits::{FileStore, NotificationStore, ProfileStore, ShareStore};
use grutto_entity::notification::CreateNotification;
use grutto_entity::profile::ProfileSummary;
use grutto_entity::share::{CreateFileShare, FileShare};

use crate::access::load_owned_file;
use crate::context::RequestContext;

/// Result of one share request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShareOutcome {
    /// Grants inserted by this request.
    pub granted: Vec<FileShare>,
    /// Requested recipients that already held a grant.
    pub already_shared: Vec<Uuid>,
    /// Notifications that were actually written.
    pub notified: usize,
}

/// A current recipient of a file.
#[derive(Debug, Clone, Serialize)]
pub struct ShareRecipient {
    /// The grant.
    pub share: FileShare,
    /// Recipient profile, if it still exists.
    pub recipient: Option<ProfileSummary>,
}

/// Manages file share grants.
#[derive(Clone)]
pub struct ShareService {
    /// File store.
    files: Arc<dyn FileStore>,
    /// Share store.
    shares: Arc<dyn ShareStore>,
    /// Profile store.
    profiles: Arc<dyn ProfileStore>,
    /// Notification store.
    notifications: Arc<dyn NotificationStore>,
    /// Recipient search limits.
    config: SharingConfig,
}

impl std::fmt::Debug for ShareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareService")
            .field("config", &self.config)
            .finish()
    }
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        files: Arc<dyn FileStore>,
        shares: Arc<dyn ShareStore>,
        profiles: Arc<dyn ProfileStore>,
        notifications: Arc<dyn NotificationStore>,
        config: SharingConfig,
    ) -> Self {
        Self {
            files,
            shares,
            profiles,
            notifications,
            config,
        }
    }

    /// Shares an owned, live file with a set of users and notifies each
    /// newly added recipient.
    pub async fn share_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        recipients: &[Uuid],
    ) -> AppResult<ShareOutcome> {
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if file.is_trashed() {
            return Err(AppError::conflict(format!(
                "{} is in the trash and cannot be shared",
                file.filename
            )));
        }

        let mut seen = HashSet::new();
        let requested: Vec<Uuid> = recipients
            .iter()
            .copied()
            .filter(|id| *id != ctx.user_id && seen.insert(*id))
            .collect();
        if requested.is_empty() {
            return Err(AppError::validation("Select at least one other user to share with"));
        }

        let known: HashSet<Uuid> = self
            .profiles
            .find_by_ids(&requested)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        if let Some(unknown) = requested.iter().find(|id| !known.contains(id)) {
            return Err(AppError::validation(format!("User {unknown} does not exist")));
        }

        let existing: HashSet<Uuid> = self
            .shares
            .find_by_file(file_id)
            .await?
            .into_iter()
            .map(|s| s.shared_with_user_id)
            .collect();

        let (already_shared, fresh): (Vec<Uuid>, Vec<Uuid>) =
            requested.into_iter().partition(|id| existing.contains(id));

        let inputs: Vec<CreateFileShare> = fresh
            .iter()
            .map(|&recipient| CreateFileShare {
                file_id,
                shared_by_user_id: ctx.user_id,
                shared_with_user_id: recipient,
            })
            .collect();
        let granted = if inputs.is_empty() {
            Vec::new()
        } else {
            self.shares.create_many(&inputs).await?
        };

        let sender_name = self.sender_name(ctx).await;
        let mut notified = 0;
        for share in &granted {
            let notice = CreateNotification::file_shared(
                share.shared_with_user_id,
                ctx.user_id,
                &sender_name,
                file_id,
                &file.filename,
            );
            match self.notifications.create(&notice).await {
                Ok(_) => notified += 1,
                Err(e) => warn!(
                    file_id = %file_id,
                    recipient_id = %share.shared_with_user_id,
                    error = %e,
                    "Failed to notify share recipient"
                ),
            }
        }

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            granted = granted.len(),
            notified,
            "File shared"
        );

        Ok(ShareOutcome {
            granted,
            already_shared,
            notified,
        })
    }

    /// Searches users to share with by username prefix.
    ///
    /// Excludes the caller, current recipients of `file_id` and anyone in
    /// `selected`. Queries shorter than the configured minimum return
    /// nothing.
    pub async fn search_recipients(
        &self,
        ctx: &RequestContext,
        query: &str,
        file_id: Option<Uuid>,
        selected: &[Uuid],
    ) -> AppResult<Vec<ProfileSummary>> {
        let query = query.trim();
        if query.chars().count() < self.config.user_search_min_chars {
            return Ok(Vec::new());
        }

        let mut exclude = vec![ctx.user_id];
        exclude.extend_from_slice(selected);
        if let Some(file_id) = file_id {
            load_owned_file(self.files.as_ref(), ctx, file_id).await?;
            exclude.extend(
                self.shares
                    .find_by_file(file_id)
                    .await?
                    .into_iter()
                    .map(|s| s.shared_with_user_id),
            );
        }

        let found = self
            .profiles
            .search_by_username_prefix(query, &exclude, self.config.user_search_limit)
            .await?;
        Ok(found.iter().map(|p| p.summary()).collect())
    }

    /// Lists who an owned file is shared with, oldest grant first.
    pub async fn list_recipients(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<Vec<ShareRecipient>> {
        load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        let shares = self.shares.find_by_file(file_id).await?;
        if shares.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = shares.iter().map(|s| s.shared_with_user_id).collect();
        let profiles: HashMap<Uuid, ProfileSummary> = self
            .profiles
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.summary()))
            .collect();

        Ok(shares
            .into_iter()
            .map(|share| {
                let recipient = profiles.get(&share.shared_with_user_id).cloned();
                ShareRecipient { share, recipient }
            })
            .collect())
    }

    /// Revokes one recipient's grant on an owned file.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        recipient_id: Uuid,
    ) -> AppResult<()> {
        load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if !self.shares.delete(file_id, recipient_id).await? {
            return Err(AppError::not_found(format!(
                "File {file_id} is not shared with user {recipient_id}"
            )));
        }

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            recipient_id = %recipient_id,
            "Share revoked"
        );
        Ok(())
    }

    async fn sender_name(&self, ctx: &RequestContext) -> String {
        match self.profiles.find_by_id(ctx.user_id).await {
            Ok(Some(profile)) => profile.visible_name().to_string(),
            _ => ctx.username.clone(),
        }
    }
}
