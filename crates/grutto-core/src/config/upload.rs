//! Upload pipeline configuration.

use serde::{Deserialize, Serialize};

/// Upload validation and transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted size of a single file (default 50 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Declared MIME types accepted by the pipeline.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
    /// Number of files transferred at the same time within one batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Size of each chunk handed to the blob store; progress is reported per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            allowed_mime_types: default_allowed_mime_types(),
            concurrency: default_concurrency(),
            chunk_size_bytes: default_chunk_size(),
        }
    }
}

fn default_max_file_size() -> u64 {
    52_428_800 // 50 MiB
}

fn default_allowed_mime_types() -> Vec<String> {
    [
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_concurrency() -> usize {
    3
}

fn default_chunk_size() -> usize {
    262_144 // 256 KiB
}
