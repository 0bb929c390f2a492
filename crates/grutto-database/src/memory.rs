//! Process-local implementation of every store trait.
//!
//! All collections live in one struct so cross-collection rules (dangling
//! folder references, purge side effects, folder delete reparenting) see a
//! consistent picture. Each map is a `DashMap`; no guard is held across
//! an access to the same map. Changes to folder parents additionally run
//! under the `hierarchy` lock so an ancestry walk and its write cannot
//! interleave with another one.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_entity::file::{CreateFile, File};
use grutto_entity::folder::{CreateFolder, Folder};
use grutto_entity::notification::{CreateNotification, Notification, NotificationType};
use grutto_entity::profile::{CreateProfile, Profile};
use grutto_entity::share::{CreateFileShare, FileShare};

use crate::traits::{
    FileStore, FolderStore, MAX_FOLDER_DEPTH, NotificationStore, ProfileStore, ShareStore,
};

/// In-memory row store.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    profiles: DashMap<Uuid, Profile>,
    usernames: DashMap<String, Uuid>,
    folders: DashMap<Uuid, Folder>,
    files: DashMap<Uuid, File>,
    shares: DashMap<(Uuid, Uuid), FileShare>,
    notifications: DashMap<Uuid, Notification>,
    hierarchy: Mutex<()>,
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a file's upload timestamp.
    pub fn set_upload_date(&self, file_id: Uuid, at: DateTime<Utc>) -> bool {
        match self.files.get_mut(&file_id) {
            Some(mut file) => {
                file.upload_date = at;
                true
            }
            None => false,
        }
    }

    /// Overwrite a notification's creation timestamp.
    pub fn set_notification_created_at(&self, id: Uuid, at: DateTime<Utc>) -> bool {
        match self.notifications.get_mut(&id) {
            Some(mut notification) => {
                notification.created_at = at;
                true
            }
            None => false,
        }
    }

    /// Point a file at an arbitrary folder ID, existing or not.
    pub fn set_folder_id(&self, file_id: Uuid, folder_id: Option<Uuid>) -> bool {
        match self.files.get_mut(&file_id) {
            Some(mut file) => {
                file.folder_id = folder_id;
                true
            }
            None => false,
        }
    }

    /// Number of share rows.
    pub fn share_count(&self) -> usize {
        self.shares.len()
    }

    fn collect_files(&self, predicate: impl Fn(&File) -> bool) -> Vec<File> {
        let mut files: Vec<File> = self
            .files
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        files.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then(b.id.cmp(&a.id)));
        files
    }

    fn update_profile(&self, id: Uuid, apply: impl FnOnce(&mut Profile)) -> AppResult<Profile> {
        let mut profile = self
            .profiles
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Profile {id} not found")))?;
        apply(&mut profile);
        Ok(profile.clone())
    }

    fn lock_hierarchy(&self) -> AppResult<MutexGuard<'_, ()>> {
        self.hierarchy
            .lock()
            .map_err(|_| AppError::internal("Folder hierarchy lock poisoned"))
    }

    fn update_file(&self, id: Uuid, apply: impl FnOnce(&mut File)) -> AppResult<File> {
        let mut file = self
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        apply(&mut file);
        Ok(file.clone())
    }
}

fn sort_folders(folders: &mut [Folder]) {
    folders.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
}

#[async_trait]
impl ProfileStore for MemoryDatabase {
    async fn create(&self, input: &CreateProfile) -> AppResult<Profile> {
        if self.profiles.contains_key(&input.id) {
            return Err(AppError::conflict(format!(
                "Profile {} already exists",
                input.id
            )));
        }
        match self.usernames.entry(input.username.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                input.username
            ))),
            Entry::Vacant(slot) => {
                let profile = Profile {
                    id: input.id,
                    username: input.username.clone(),
                    display_name: input.display_name.clone(),
                    email: input.email.clone(),
                    profile_picture_url: None,
                    storage_used: 0,
                    created_at: Utc::now(),
                };
                self.profiles.insert(profile.id, profile.clone());
                slot.insert(profile.id);
                Ok(profile)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|p| p.clone()))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        Ok(ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| self.profiles.get(id).map(|p| p.clone()))
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        let id = self.usernames.get(username).map(|id| *id);
        Ok(id.and_then(|id| self.profiles.get(&id).map(|p| p.clone())))
    }

    async fn search_by_username_prefix(
        &self,
        prefix: &str,
        exclude: &[Uuid],
        limit: i64,
    ) -> AppResult<Vec<Profile>> {
        let prefix = prefix.to_lowercase();
        let mut matches: Vec<Profile> = self
            .profiles
            .iter()
            .filter(|p| !exclude.contains(&p.id) && p.username.to_lowercase().starts_with(&prefix))
            .map(|p| p.clone())
            .collect();
        matches.sort_by(|a, b| a.username.cmp(&b.username));
        matches.truncate(limit.max(0) as usize);
        Ok(matches)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: Option<&str>,
    ) -> AppResult<Profile> {
        self.update_profile(id, |p| p.display_name = display_name.map(str::to_string))
    }

    async fn update_picture_url(&self, id: Uuid, url: Option<&str>) -> AppResult<Profile> {
        self.update_profile(id, |p| p.profile_picture_url = url.map(str::to_string))
    }

    async fn adjust_storage_used(&self, id: Uuid, delta: i64) -> AppResult<()> {
        self.update_profile(id, |p| {
            p.storage_used = p.storage_used.saturating_add(delta).max(0)
        })?;
        Ok(())
    }
}

#[async_trait]
impl FolderStore for MemoryDatabase {
    async fn create(&self, input: &CreateFolder) -> AppResult<Folder> {
        let now = Utc::now();
        let folder = Folder {
            id: Uuid::now_v7(),
            name: input.name.clone(),
            color: input.color.clone(),
            owner_id: input.owner_id,
            parent_folder_id: input.parent_folder_id,
            created_at: now,
            updated_at: now,
        };
        self.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        Ok(self.folders.get(&id).map(|f| f.clone()))
    }

    async fn find_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .folders
            .iter()
            .filter(|f| f.owner_id == owner_id && f.parent_folder_id == parent_id)
            .map(|f| f.clone())
            .collect();
        sort_folders(&mut folders);
        Ok(folders)
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .folders
            .iter()
            .filter(|f| f.owner_id == owner_id)
            .map(|f| f.clone())
            .collect();
        sort_folders(&mut folders);
        Ok(folders)
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        let mut stored = self
            .folders
            .get_mut(&folder.id)
            .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))?;
        stored.name = folder.name.clone();
        stored.color = folder.color.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn reparent(&self, id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<Folder> {
        let _hierarchy = self.lock_hierarchy()?;
        if !self.folders.contains_key(&id) {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }

        if let Some(parent_id) = new_parent_id {
            let mut cursor = Some(
                self.folders
                    .get(&parent_id)
                    .map(|f| f.id)
                    .ok_or_else(|| AppError::not_found(format!("Folder {parent_id} not found")))?,
            );
            let mut steps = 0usize;
            while let Some(current) = cursor {
                if current == id {
                    return Err(AppError::validation(
                        "Cannot move a folder into one of its own subfolders",
                    ));
                }
                steps += 1;
                if steps > MAX_FOLDER_DEPTH {
                    return Err(AppError::internal(format!(
                        "Folder ancestry of {parent_id} is deeper than {MAX_FOLDER_DEPTH}"
                    )));
                }
                cursor = self
                    .folders
                    .get(&current)
                    .and_then(|f| f.parent_folder_id);
            }
        }

        let mut stored = self
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        stored.parent_folder_id = new_parent_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn count_files(&self, folder_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        let wanted: HashSet<&Uuid> = folder_ids.iter().collect();
        let mut counts = HashMap::new();
        for file in self.files.iter() {
            if file.deleted_at.is_some() {
                continue;
            }
            if let Some(folder_id) = file.folder_id.filter(|id| wanted.contains(id)) {
                *counts.entry(folder_id).or_insert(0u64) += 1;
            }
        }
        Ok(counts)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _hierarchy = self.lock_hierarchy()?;
        let (_, removed) = self
            .folders
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;

        for mut file in self.files.iter_mut() {
            if file.folder_id == Some(id) {
                file.folder_id = None;
            }
        }
        let now = Utc::now();
        for mut folder in self.folders.iter_mut() {
            if folder.parent_folder_id == Some(id) {
                folder.parent_folder_id = removed.parent_folder_id;
                folder.updated_at = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryDatabase {
    async fn create(&self, input: &CreateFile) -> AppResult<File> {
        let file = File {
            id: Uuid::now_v7(),
            filename: input.filename.clone(),
            file_type: input.file_type.clone(),
            file_size: input.file_size,
            storage_url: input.storage_url.clone(),
            owner_id: input.owner_id,
            folder_id: input.folder_id,
            upload_date: Utc::now(),
            last_accessed: None,
            thumbnail_url: None,
            is_favorite: false,
            deleted_at: None,
            deleted_by: None,
        };
        if self
            .files
            .iter()
            .any(|f| f.storage_url == file.storage_url)
        {
            return Err(AppError::conflict(format!(
                "Storage key '{}' is already in use",
                file.storage_url
            )));
        }
        self.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        Ok(self.files.get(&id).map(|f| f.clone()))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        Ok(ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| self.files.get(id).map(|f| f.clone()))
            .collect())
    }

    async fn find_root_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        let folder_ids: HashSet<Uuid> = self.folders.iter().map(|f| f.id).collect();
        Ok(self.collect_files(|f| {
            f.owner_id == owner_id
                && f.deleted_at.is_none()
                && f.folder_id.is_none_or(|id| !folder_ids.contains(&id))
        }))
    }

    async fn find_recent_by_owner(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<File>> {
        let mut files = self.collect_files(|f| f.owner_id == owner_id && f.deleted_at.is_none());
        files.truncate(limit.max(0) as usize);
        Ok(files)
    }

    async fn find_by_folder(&self, folder_id: Uuid) -> AppResult<Vec<File>> {
        Ok(self.collect_files(|f| f.folder_id == Some(folder_id) && f.deleted_at.is_none()))
    }

    async fn find_shared_with(&self, user_id: Uuid, limit: Option<i64>) -> AppResult<Vec<File>> {
        let shared: HashSet<Uuid> = self
            .shares
            .iter()
            .filter(|s| s.shared_with_user_id == user_id)
            .map(|s| s.file_id)
            .collect();
        let mut files = self.collect_files(|f| shared.contains(&f.id) && f.deleted_at.is_none());
        if let Some(limit) = limit {
            files.truncate(limit.max(0) as usize);
        }
        Ok(files)
    }

    async fn find_favorites(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        Ok(self.collect_files(|f| f.owner_id == owner_id && f.is_favorite && f.deleted_at.is_none()))
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        let mut files = self.collect_files(|f| f.owner_id == owner_id && f.deleted_at.is_some());
        files.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(b.id.cmp(&a.id)));
        Ok(files)
    }

    async fn rename(&self, id: Uuid, filename: &str) -> AppResult<File> {
        self.update_file(id, |f| f.filename = filename.to_string())
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File> {
        self.update_file(id, |f| f.folder_id = folder_id)
    }

    async fn set_favorite(&self, id: Uuid, is_favorite: bool) -> AppResult<File> {
        self.update_file(id, |f| f.is_favorite = is_favorite)
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut file) = self.files.get_mut(&id) {
            file.last_accessed = Some(at);
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> AppResult<File> {
        let mut file = self
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if file.deleted_at.is_some() {
            return Err(AppError::conflict(format!("File {id} is not active")));
        }
        file.deleted_at = Some(Utc::now());
        file.deleted_by = Some(deleted_by);
        Ok(file.clone())
    }

    async fn restore(&self, id: Uuid) -> AppResult<File> {
        let mut file = self
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if file.deleted_at.is_none() {
            return Err(AppError::conflict(format!("File {id} is not in the trash")));
        }
        file.deleted_at = None;
        file.deleted_by = None;
        Ok(file.clone())
    }

    async fn purge(&self, id: Uuid) -> AppResult<()> {
        if self.files.remove(&id).is_none() {
            return Err(AppError::not_found(format!("File {id} not found")));
        }
        self.notifications
            .retain(|_, n| !(n.file_id == Some(id) && n.kind == NotificationType::FileDeleted));
        for mut notification in self.notifications.iter_mut() {
            if notification.file_id == Some(id) {
                notification.file_id = None;
            }
        }
        self.shares.retain(|(file_id, _), _| *file_id != id);
        Ok(())
    }
}

#[async_trait]
impl ShareStore for MemoryDatabase {
    async fn create_many(&self, inputs: &[CreateFileShare]) -> AppResult<Vec<FileShare>> {
        let mut inserted = Vec::new();
        for input in inputs {
            if let Entry::Vacant(slot) = self
                .shares
                .entry((input.file_id, input.shared_with_user_id))
            {
                let share = FileShare {
                    id: Uuid::now_v7(),
                    file_id: input.file_id,
                    shared_by_user_id: input.shared_by_user_id,
                    shared_with_user_id: input.shared_with_user_id,
                    shared_date: Utc::now(),
                };
                slot.insert(share.clone());
                inserted.push(share);
            }
        }
        Ok(inserted)
    }

    async fn find_by_file(&self, file_id: Uuid) -> AppResult<Vec<FileShare>> {
        let mut shares: Vec<FileShare> = self
            .shares
            .iter()
            .filter(|s| s.file_id == file_id)
            .map(|s| s.clone())
            .collect();
        shares.sort_by(|a, b| a.shared_date.cmp(&b.shared_date).then(a.id.cmp(&b.id)));
        Ok(shares)
    }

    async fn find(&self, file_id: Uuid, user_id: Uuid) -> AppResult<Option<FileShare>> {
        Ok(self.shares.get(&(file_id, user_id)).map(|s| s.clone()))
    }

    async fn delete(&self, file_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.shares.remove(&(file_id, user_id)).is_some())
    }
}

#[async_trait]
impl NotificationStore for MemoryDatabase {
    async fn create(&self, input: &CreateNotification) -> AppResult<Notification> {
        let notification = Notification {
            id: Uuid::now_v7(),
            recipient_id: input.recipient_id,
            sender_id: input.sender_id,
            kind: input.kind,
            file_id: input.file_id,
            message: input.message.clone(),
            read_status: false,
            created_at: Utc::now(),
        };
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self.notifications.get(&id).map(|n| n.clone()))
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> AppResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn count_unread(&self, recipient_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.read_status && n.created_at >= since)
            .count() as i64)
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        match self.notifications.get_mut(&id) {
            Some(mut n) if n.recipient_id == recipient_id => {
                n.read_status = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> AppResult<u64> {
        let mut changed = 0;
        for mut n in self.notifications.iter_mut() {
            if n.recipient_id == recipient_id && !n.read_status {
                n.read_status = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        Ok(self
            .notifications
            .remove_if(&id, |_, n| n.recipient_id == recipient_id)
            .is_some())
    }

    async fn delete_for_file(&self, file_id: Uuid, kind: NotificationType) -> AppResult<u64> {
        let before = self.notifications.len();
        self.notifications
            .retain(|_, n| !(n.file_id == Some(file_id) && n.kind == kind));
        Ok((before - self.notifications.len()) as u64)
    }

    async fn delete_older_than(
        &self,
        recipient_id: Option<Uuid>,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        let before = self.notifications.len();
        self.notifications.retain(|_, n| {
            let in_scope = recipient_id.is_none_or(|r| n.recipient_id == r);
            !(in_scope && n.created_at < cutoff)
        });
        Ok((before - self.notifications.len()) as u64)
    }
}
