//! Blob storage for uploaded video files
//!
//! Blobs are addressed by a flat storage key (`{uuid}{ext}`). The streaming
//! core only needs `exists` and `open`; uploads and deletes go through the
//! same trait so one backend serves the whole service.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};

use crate::error::StorageError;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Seekable read handle over a stored blob
pub trait BlobRead: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> BlobRead for T {}

pub type BlobReader = Box<dyn BlobRead>;
pub type BlobWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Check if a blob exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Open a blob for reading
    ///
    /// Returns `StorageError::NotFound` if the blob doesn't exist.
    async fn open(&self, key: &str) -> StorageResult<BlobReader>;

    /// Create (or truncate) a blob for writing
    async fn create(&self, key: &str) -> StorageResult<BlobWriter>;

    /// Delete a blob
    ///
    /// Returns `Ok(())` even if the blob didn't exist (idempotent).
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Reject keys that could escape the storage root
fn validate_key(key: &str) -> StorageResult<()> {
    let mut components = Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StorageError::InvalidKey(key.to_string())),
    }
}

/// Local filesystem storage
///
/// Stores every blob as `{root}/{key}`.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create storage at the given root directory
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "local blob store ready");
        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.blob_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn open(&self, key: &str) -> StorageResult<BlobReader> {
        let path = self.blob_path(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, key: &str) -> StorageResult<BlobWriter> {
        let path = self.blob_path(key)?;
        let file = fs::File::create(&path).await?;
        Ok(Box::new(file))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

type BlobMap = Arc<Mutex<HashMap<String, Vec<u8>>>>;

/// In-memory storage for development and tests
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: BlobMap,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a whole blob at once
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.lock().insert(key.into(), data.into());
    }

    /// Copy of a stored blob
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.lock().get(key).map(|data| Bytes::copy_from_slice(data))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still structurally valid
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.lock().contains_key(key))
    }

    async fn open(&self, key: &str) -> StorageResult<BlobReader> {
        let data = self
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn create(&self, key: &str) -> StorageResult<BlobWriter> {
        self.lock().insert(key.to_string(), Vec::new());
        Ok(Box::new(MemoryBlobWriter {
            blobs: self.blobs.clone(),
            key: key.to_string(),
        }))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Appends every write straight into the shared map
struct MemoryBlobWriter {
    blobs: BlobMap,
    key: String,
}

impl AsyncWrite for MemoryBlobWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.entry(self.key.clone()).or_default().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
