//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use uuid::Uuid;

use grutto_core::config::AppConfig;
use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_core::traits::{BlobStore, ByteStream, SignedUrl};
use grutto_database::traits::{FileStore, FolderStore, NotificationStore};
use grutto_database::{MemoryDatabase, Repositories};
use grutto_entity::file::{CreateFile, File};
use grutto_entity::folder::{CreateFolder, Folder};
use grutto_entity::notification::{CreateNotification, Notification, NotificationType};
use grutto_service::file::{UploadCandidate, UploadOptions};
use grutto_service::profile::RegisterProfile;
use grutto_service::{DomainServices, RequestContext};
use grutto_storage::{MemoryBlobStore, SignedUrlIssuer};

pub const PDF: &str = "application/pdf";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Which stores a [`TestApp`] replaces with test doubles.
#[derive(Debug, Default, Clone, Copy)]
struct Doubles {
    blobs: bool,
    notifications: bool,
    files: bool,
    yield_reads: bool,
}

/// Test application context over in-memory stores.
pub struct TestApp {
    /// Every service, wired to the stores below.
    pub services: DomainServices,
    /// The row store, for direct inspection.
    pub db: Arc<MemoryDatabase>,
    /// The blob store, for direct inspection.
    pub blobs: Arc<MemoryBlobStore>,
    /// Blob delete switch, when built with [`TestApp::with_failing_blobs`].
    pub blob_delete_fails: Arc<AtomicBool>,
    /// Streams of exactly this many bytes fail to store, when built with
    /// [`TestApp::with_failing_blobs`]. Zero disables it.
    pub blob_put_fail_size: Arc<AtomicU64>,
    /// Notification insert switch, when built with
    /// [`TestApp::with_failing_notifications`].
    pub notify_fails: Arc<AtomicBool>,
    /// File rows of exactly this size fail to insert, when built with
    /// [`TestApp::with_failing_file_rows`]. Zero disables it.
    pub file_create_fail_size: Arc<AtomicU64>,
    /// Application config.
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application.
    pub fn new() -> Self {
        Self::build(Doubles::default())
    }

    /// A test application whose blob writes and deletes fail once switched on.
    pub fn with_failing_blobs() -> Self {
        Self::build(Doubles {
            blobs: true,
            ..Default::default()
        })
    }

    /// A test application whose notification inserts fail once switched on.
    pub fn with_failing_notifications() -> Self {
        Self::build(Doubles {
            notifications: true,
            ..Default::default()
        })
    }

    /// A test application whose file row inserts fail for one size.
    pub fn with_failing_file_rows() -> Self {
        Self::build(Doubles {
            files: true,
            ..Default::default()
        })
    }

    /// A test application whose folder and file lookups yield to the
    /// scheduler, so concurrent operations interleave between their
    /// read and their write.
    pub fn with_yielding_reads() -> Self {
        Self::build(Doubles {
            files: true,
            yield_reads: true,
            ..Default::default()
        })
    }

    fn build(doubles: Doubles) -> Self {
        let mut config = AppConfig::default();
        config.upload.chunk_size_bytes = 64 * 1024;
        let db = Arc::new(MemoryDatabase::new());
        let blobs = Arc::new(MemoryBlobStore::new(SignedUrlIssuer::new(
            &config.storage.signed_url,
        )));
        let blob_delete_fails = Arc::new(AtomicBool::new(false));
        let blob_put_fail_size = Arc::new(AtomicU64::new(0));
        let notify_fails = Arc::new(AtomicBool::new(false));
        let file_create_fail_size = Arc::new(AtomicU64::new(0));

        let mut repos = Repositories::from_memory(db.clone());
        if doubles.notifications {
            repos.notifications = Arc::new(FlakyNotifications {
                inner: db.clone(),
                fail: notify_fails.clone(),
            });
        }
        if doubles.files {
            repos.files = Arc::new(TestFiles {
                inner: db.clone(),
                fail_create_size: file_create_fail_size.clone(),
                yield_reads: doubles.yield_reads,
            });
        }
        if doubles.yield_reads {
            repos.folders = Arc::new(YieldingFolders { inner: db.clone() });
        }
        let blob_store: Arc<dyn BlobStore> = if doubles.blobs {
            Arc::new(FlakyBlobs {
                inner: blobs.clone(),
                fail_delete: blob_delete_fails.clone(),
                fail_put_size: blob_put_fail_size.clone(),
            })
        } else {
            blobs.clone()
        };

        let services = DomainServices::new(&repos, blob_store, &config);
        Self {
            services,
            db,
            blobs,
            blob_delete_fails,
            blob_put_fail_size,
            notify_fails,
            file_create_fail_size,
            config,
        }
    }

    /// Register a profile and return its request context.
    pub async fn user(&self, username: &str) -> RequestContext {
        let profile = self
            .services
            .profiles
            .register(RegisterProfile {
                id: Uuid::new_v4(),
                username: username.to_string(),
                display_name: None,
                email: format!("{username}@example.com"),
            })
            .await
            .expect("Failed to register test user");
        RequestContext::new(profile.id, profile.username)
    }

    /// Upload one file of `size` zero bytes and return its row.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        filename: &str,
        mime: &str,
        size: usize,
    ) -> File {
        self.upload_into(ctx, filename, mime, size, None).await
    }

    /// Upload one file into a folder.
    pub async fn upload_into(
        &self,
        ctx: &RequestContext,
        filename: &str,
        mime: &str,
        size: usize,
        folder_id: Option<Uuid>,
    ) -> File {
        let mut report = self
            .services
            .upload
            .upload_batch(
                ctx,
                vec![UploadCandidate::new(filename, mime, Bytes::from(vec![0u8; size]))],
                UploadOptions {
                    folder_id,
                    ..Default::default()
                },
            )
            .await
            .expect("Upload batch failed");
        assert!(report.failed.is_empty(), "Upload failed: {:?}", report.failed);
        report.uploaded.remove(0)
    }
}

/// Blob store whose `delete` fails while the switch is on and whose
/// `put_stream` fails for streams of one configured length.
#[derive(Debug)]
struct FlakyBlobs {
    inner: Arc<MemoryBlobStore>,
    fail_delete: Arc<AtomicBool>,
    fail_put_size: Arc<AtomicU64>,
}

#[async_trait]
impl BlobStore for FlakyBlobs {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.inner.put(key, data).await
    }

    async fn put_stream(&self, key: &str, mut stream: ByteStream) -> AppResult<u64> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::storage(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
        }
        let total = buffer.len() as u64;
        let fail_size = self.fail_put_size.load(Ordering::SeqCst);
        if fail_size != 0 && total == fail_size {
            return Err(AppError::storage("blob backend rejected the write"));
        }
        self.inner.put(key, buffer.freeze()).await?;
        Ok(total)
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::storage("blob backend unreachable"));
        }
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<SignedUrl> {
        self.inner.signed_url(key, ttl).await
    }
}

/// Notification store whose `create` fails while the switch is on.
#[derive(Debug)]
struct FlakyNotifications {
    inner: Arc<MemoryDatabase>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl NotificationStore for FlakyNotifications {
    async fn create(&self, input: &CreateNotification) -> AppResult<Notification> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::database("notifications table locked"));
        }
        NotificationStore::create(self.inner.as_ref(), input).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        NotificationStore::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_by_recipient(&self, recipient_id: Uuid) -> AppResult<Vec<Notification>> {
        self.inner.find_by_recipient(recipient_id).await
    }

    async fn count_unread(&self, recipient_id: Uuid, since: DateTime<Utc>) -> AppResult<i64> {
        self.inner.count_unread(recipient_id, since).await
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        self.inner.mark_read(id, recipient_id).await
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> AppResult<u64> {
        self.inner.mark_all_read(recipient_id).await
    }

    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        NotificationStore::delete(self.inner.as_ref(), id, recipient_id).await
    }

    async fn delete_for_file(&self, file_id: Uuid, kind: NotificationType) -> AppResult<u64> {
        self.inner.delete_for_file(file_id, kind).await
    }

    async fn delete_older_than(
        &self,
        recipient_id: Option<Uuid>,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.inner.delete_older_than(recipient_id, cutoff).await
    }
}

/// File store whose `create` fails for rows of one configured size and
/// whose `find_by_id` can yield before returning.
#[derive(Debug)]
struct TestFiles {
    inner: Arc<MemoryDatabase>,
    fail_create_size: Arc<AtomicU64>,
    yield_reads: bool,
}

#[async_trait]
impl FileStore for TestFiles {
    async fn create(&self, input: &CreateFile) -> AppResult<File> {
        let fail_size = self.fail_create_size.load(Ordering::SeqCst);
        if fail_size != 0 && input.file_size as u64 == fail_size {
            return Err(AppError::database("files table rejected the insert"));
        }
        FileStore::create(self.inner.as_ref(), input).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        let file = FileStore::find_by_id(self.inner.as_ref(), id).await?;
        if self.yield_reads {
            tokio::task::yield_now().await;
        }
        Ok(file)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        FileStore::find_by_ids(self.inner.as_ref(), ids).await
    }

    async fn find_root_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        self.inner.find_root_by_owner(owner_id).await
    }

    async fn find_recent_by_owner(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<File>> {
        self.inner.find_recent_by_owner(owner_id, limit).await
    }

    async fn find_by_folder(&self, folder_id: Uuid) -> AppResult<Vec<File>> {
        self.inner.find_by_folder(folder_id).await
    }

    async fn find_shared_with(&self, user_id: Uuid, limit: Option<i64>) -> AppResult<Vec<File>> {
        self.inner.find_shared_with(user_id, limit).await
    }

    async fn find_favorites(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        self.inner.find_favorites(owner_id).await
    }

    async fn find_trashed(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        self.inner.find_trashed(owner_id).await
    }

    async fn rename(&self, id: Uuid, filename: &str) -> AppResult<File> {
        self.inner.rename(id, filename).await
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<File> {
        self.inner.set_folder(id, folder_id).await
    }

    async fn set_favorite(&self, id: Uuid, is_favorite: bool) -> AppResult<File> {
        self.inner.set_favorite(id, is_favorite).await
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.inner.touch(id, at).await
    }

    async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> AppResult<File> {
        self.inner.soft_delete(id, deleted_by).await
    }

    async fn restore(&self, id: Uuid) -> AppResult<File> {
        self.inner.restore(id).await
    }

    async fn purge(&self, id: Uuid) -> AppResult<()> {
        self.inner.purge(id).await
    }
}

/// Folder store whose `find_by_id` yields before returning.
#[derive(Debug)]
struct YieldingFolders {
    inner: Arc<MemoryDatabase>,
}

#[async_trait]
impl FolderStore for YieldingFolders {
    async fn create(&self, input: &CreateFolder) -> AppResult<Folder> {
        FolderStore::create(self.inner.as_ref(), input).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        let folder = FolderStore::find_by_id(self.inner.as_ref(), id).await?;
        tokio::task::yield_now().await;
        Ok(folder)
    }

    async fn find_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        self.inner.find_children(owner_id, parent_id).await
    }

    async fn find_all_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        self.inner.find_all_by_owner(owner_id).await
    }

    async fn update(&self, folder: &Folder) -> AppResult<Folder> {
        FolderStore::update(self.inner.as_ref(), folder).await
    }

    async fn reparent(&self, id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<Folder> {
        self.inner.reparent(id, new_parent_id).await
    }

    async fn count_files(&self, folder_ids: &[Uuid]) -> AppResult<HashMap<Uuid, u64>> {
        self.inner.count_files(folder_ids).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        FolderStore::delete(self.inner.as_ref(), id).await
    }
}
