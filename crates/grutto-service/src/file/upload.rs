//! Batch upload pipeline.
//!
//! Each candidate is validated, streamed to the blob store in chunks
//! (one progress event per chunk) and registered as a file row. A failure
//! affects only its own candidate. A row insert failing after the blob
//! was written triggers a compensating blob delete, so no row ever points
//! at a missing blob and no blob outlives a failed upload.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use grutto_core::config::UploadConfig;
use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_core::traits::{BlobStore, ByteStream};
use grutto_database::traits::{FileStore, FolderStore, ProfileStore};
use grutto_entity::file::{CreateFile, File};

use crate::access::load_owned_folder;
use crate::context::RequestContext;

/// One file offered for upload.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    /// Display name, kept only in the file row.
    pub filename: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// File contents.
    pub data: Bytes,
}

impl UploadCandidate {
    /// Creates a candidate.
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Byte length.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Observable progress of a batch. `index` is the candidate's position.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    /// Bytes handed to the blob store so far. Reaches 100 only once the
    /// file row exists.
    Progress {
        /// Candidate position.
        index: usize,
        /// Display name.
        filename: String,
        /// Bytes transferred.
        bytes_sent: u64,
        /// Total bytes.
        total_bytes: u64,
        /// 0 to 100.
        percent: u8,
    },
    /// The file is stored and registered.
    Uploaded {
        /// Candidate position.
        index: usize,
        /// The new row.
        file: File,
    },
    /// The candidate was rejected or failed.
    Failed {
        /// Candidate position.
        index: usize,
        /// Display name.
        filename: String,
        /// User-facing reason.
        reason: String,
    },
    /// Every candidate has finished, successfully or not.
    BatchComplete {
        /// Files stored.
        uploaded: usize,
        /// Candidates that failed.
        failed: usize,
    },
}

/// Why one candidate did not become a file.
#[derive(Debug, Clone)]
pub struct UploadFailure {
    /// Candidate position.
    pub index: usize,
    /// Display name.
    pub filename: String,
    /// The error.
    pub error: AppError,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Stored files, in candidate order.
    pub uploaded: Vec<File>,
    /// Failed candidates, in candidate order.
    pub failed: Vec<UploadFailure>,
}

/// Optional knobs for a batch.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Folder to upload into; must belong to the caller.
    pub folder_id: Option<Uuid>,
    /// Receives progress and completion events.
    pub events: Option<UnboundedSender<UploadEvent>>,
    /// Candidates not yet started when this fires fail as cancelled.
    /// Transfers already in flight finish.
    pub cancel: Option<CancellationToken>,
}

/// Validates, stores, and registers uploaded files.
#[derive(Clone)]
pub struct UploadService {
    /// File store.
    files: Arc<dyn FileStore>,
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Profile store, for storage accounting.
    profiles: Arc<dyn ProfileStore>,
    /// Blob store.
    blobs: Arc<dyn BlobStore>,
    /// Upload limits.
    config: UploadConfig,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService").finish()
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        profiles: Arc<dyn ProfileStore>,
        blobs: Arc<dyn BlobStore>,
        config: UploadConfig,
    ) -> Self {
        Self {
            files,
            folders,
            profiles,
            blobs,
            config,
        }
    }

    /// Check a candidate against the name, type and size rules.
    pub fn validate(&self, candidate: &UploadCandidate) -> AppResult<()> {
        if candidate.filename.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        let mime = candidate.mime_type.trim();
        if !self
            .config
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime))
        {
            return Err(AppError::validation(format!(
                "{}: only PDF, Word, Excel and PowerPoint files are allowed",
                candidate.filename
            )));
        }
        if candidate.size() > self.config.max_file_size_bytes {
            return Err(AppError::validation(format!(
                "{}: file exceeds the maximum size of {} bytes",
                candidate.filename, self.config.max_file_size_bytes
            )));
        }
        Ok(())
    }

    /// Upload a batch. Per-candidate failures land in the report; only a
    /// bad target folder fails the whole call, before anything is stored.
    pub async fn upload_batch(
        &self,
        ctx: &RequestContext,
        candidates: Vec<UploadCandidate>,
        options: UploadOptions,
    ) -> AppResult<UploadReport> {
        if let Some(folder_id) = options.folder_id {
            load_owned_folder(self.folders.as_ref(), ctx, folder_id).await?;
        }

        let concurrency = self.config.concurrency.max(1);
        let mut outcomes: Vec<(usize, String, AppResult<File>)> =
            stream::iter(candidates.into_iter().enumerate())
                .map(|(index, candidate)| {
                    let options = &options;
                    async move {
                        let filename = candidate.filename.clone();
                        let outcome = self.upload_one(ctx, index, candidate, options).await;
                        (index, filename, outcome)
                    }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut report = UploadReport::default();
        for (index, filename, outcome) in outcomes {
            match outcome {
                Ok(file) => report.uploaded.push(file),
                Err(error) => report.failed.push(UploadFailure {
                    index,
                    filename,
                    error,
                }),
            }
        }

        info!(
            user_id = %ctx.user_id,
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "Upload batch finished"
        );
        emit(
            &options.events,
            UploadEvent::BatchComplete {
                uploaded: report.uploaded.len(),
                failed: report.failed.len(),
            },
        );
        Ok(report)
    }

    async fn upload_one(
        &self,
        ctx: &RequestContext,
        index: usize,
        candidate: UploadCandidate,
        options: &UploadOptions,
    ) -> AppResult<File> {
        let result = self.try_upload(ctx, index, candidate.clone(), options).await;
        match &result {
            Ok(file) => {
                emit(
                    &options.events,
                    UploadEvent::Progress {
                        index,
                        filename: candidate.filename.clone(),
                        bytes_sent: candidate.size(),
                        total_bytes: candidate.size(),
                        percent: 100,
                    },
                );
                emit(
                    &options.events,
                    UploadEvent::Uploaded {
                        index,
                        file: file.clone(),
                    },
                );
            }
            Err(e) => {
                warn!(
                    user_id = %ctx.user_id,
                    filename = %candidate.filename,
                    error = %e,
                    "Upload failed"
                );
                emit(
                    &options.events,
                    UploadEvent::Failed {
                        index,
                        filename: candidate.filename.clone(),
                        reason: e.user_message().to_string(),
                    },
                );
            }
        }
        result
    }

    async fn try_upload(
        &self,
        ctx: &RequestContext,
        index: usize,
        candidate: UploadCandidate,
        options: &UploadOptions,
    ) -> AppResult<File> {
        if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(AppError::cancelled(format!(
                "Upload of {} was cancelled",
                candidate.filename
            )));
        }
        self.validate(&candidate)?;

        let key = storage_key(ctx.user_id, &candidate.filename);
        let size = candidate.size();
        let body = progress_stream(
            index,
            candidate.filename.clone(),
            candidate.data.clone(),
            self.config.chunk_size_bytes,
            options.events.clone(),
        );
        self.blobs.put_stream(&key, body).await?;

        let input = CreateFile {
            owner_id: ctx.user_id,
            filename: candidate.filename.trim().to_string(),
            file_type: candidate.mime_type.trim().to_string(),
            file_size: size as i64,
            storage_url: key.clone(),
            folder_id: options.folder_id,
        };
        let file = match self.files.create(&input).await {
            Ok(file) => file,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove blob of failed upload");
                }
                return Err(e);
            }
        };

        if let Err(e) = self.profiles.adjust_storage_used(ctx.user_id, file.file_size).await {
            warn!(user_id = %ctx.user_id, error = %e, "Failed to update storage usage");
        }
        info!(file_id = %file.id, user_id = %ctx.user_id, size, "File uploaded");
        Ok(file)
    }
}

fn emit(events: &Option<UnboundedSender<UploadEvent>>, event: UploadEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Blob key `{owner}/{uuid}` plus the lowercased extension, if it is a
/// plain alphanumeric one. The display name never enters the key.
pub fn storage_key(owner_id: Uuid, filename: &str) -> String {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{owner_id}/{}{extension}", Uuid::new_v4())
}

/// Split `data` into chunks and report progress as each one is consumed.
fn progress_stream(
    index: usize,
    filename: String,
    data: Bytes,
    chunk_size: usize,
    events: Option<UnboundedSender<UploadEvent>>,
) -> ByteStream {
    let total = data.len() as u64;
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect();

    emit(
        &events,
        UploadEvent::Progress {
            index,
            filename: filename.clone(),
            bytes_sent: 0,
            total_bytes: total,
            percent: 0,
        },
    );

    let mut sent = 0u64;
    Box::pin(stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        emit(
            &events,
            UploadEvent::Progress {
                index,
                filename: filename.clone(),
                bytes_sent: sent,
                total_bytes: total,
                percent: transfer_percent(sent, total),
            },
        );
        Ok::<_, std::io::Error>(chunk)
    }))
}

/// Transfer share of the work, capped at 99 until the row is committed.
fn transfer_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 99;
    }
    ((sent.saturating_mul(100) / total).min(99)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_shape() {
        let owner = Uuid::new_v4();
        let key = storage_key(owner, "Lecture 1.PDF");
        assert!(key.starts_with(&format!("{owner}/")));
        assert!(key.ends_with(".pdf"));
        assert!(!key.contains("Lecture"));

        let bare = storage_key(owner, "README");
        assert_eq!(bare.len(), owner.to_string().len() + 1 + 36);
        assert_ne!(storage_key(owner, "a.pdf"), storage_key(owner, "a.pdf"));
    }

    #[test]
    fn test_odd_extensions_dropped() {
        let owner = Uuid::new_v4();
        assert!(!storage_key(owner, "x.p/df").contains("/df"));
        assert!(!storage_key(owner, "trailing.").ends_with('.'));
    }

    #[test]
    fn test_transfer_percent() {
        assert_eq!(transfer_percent(0, 100), 0);
        assert_eq!(transfer_percent(50, 100), 50);
        assert_eq!(transfer_percent(100, 100), 99);
        assert_eq!(transfer_percent(0, 0), 99);
    }

    #[tokio::test]
    async fn test_progress_stream_chunks() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let stream = progress_stream(0, "a.pdf".into(), Bytes::from(vec![7u8; 10]), 4, Some(tx));
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 3);

        let mut sent = Vec::new();
        while let Ok(UploadEvent::Progress { bytes_sent, .. }) = rx.try_recv() {
            sent.push(bytes_sent);
        }
        assert_eq!(sent, vec![0, 4, 8, 10]);
    }
}
