// Media Storage - durable references for uploaded video and image files

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{AppError, AppResult};

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    pub secure_url: String,
}

/// Accepts raw bytes and returns a durable reference URL, or fails.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, data: &[u8], file_name: &str) -> AppResult<StoredMedia>;
}

/// Stores files on local disk and serves them from `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStorage {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload(&self, data: &[u8], file_name: &str) -> AppResult<StoredMedia> {
        if data.is_empty() {
            return Err(AppError::UploadFailed(format!("{} is empty", file_name)));
        }

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::UploadFailed(format!("Cannot create {}: {}", self.root.display(), e))
        })?;

        let stored_name = stored_file_name(file_name);
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::UploadFailed(format!("Cannot write {}: {}", path.display(), e))
        })?;

        info!("Stored {} ({} bytes) as {}", file_name, data.len(), stored_name);
        Ok(StoredMedia {
            secure_url: format!("{}/{}", self.public_base_url, stored_name),
        })
    }
}

/// Random name that keeps a short alphanumeric extension from the client's name.
fn stored_file_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// In-process storage for tests. Can be told to start failing after
/// a number of successful uploads.
#[derive(Debug, Default)]
pub struct MemoryMediaStorage {
    uploads: AtomicUsize,
    fail_after: Option<usize>,
}

impl MemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(successes: usize) -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            fail_after: Some(successes),
        }
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStorage for MemoryMediaStorage {
    async fn upload(&self, data: &[u8], file_name: &str) -> AppResult<StoredMedia> {
        if data.is_empty() {
            return Err(AppError::UploadFailed(format!("{} is empty", file_name)));
        }
        if let Some(limit) = self.fail_after {
            if self.uploads.load(Ordering::SeqCst) >= limit {
                return Err(AppError::UploadFailed(format!("{} rejected", file_name)));
            }
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(StoredMedia {
            secure_url: format!("memory://{}/{}", n, stored_file_name(file_name)),
        })
    }
}
