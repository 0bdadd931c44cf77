//! Error types for the streaming core

use thiserror::Error;

/// Why an access check did not yield the resource
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Post not found")]
    NotFound,

    #[error("Access denied")]
    Forbidden,

    /// Backing store failed while resolving access
    #[error("Access store error: {0}")]
    Store(String),
}

/// Failures of Range header parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("Requested range not satisfiable")]
    NotSatisfiable { total: u64 },

    #[error("Malformed range header: {0}")]
    Malformed(String),
}

/// Failures of the blob storage collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can stop a stream response from being built
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Range(#[from] RangeError),

    /// Metadata exists but the physical blob does not
    #[error("Video file not found")]
    BlobMissing { storage_key: String },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for StreamError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(storage_key) => StreamError::BlobMissing { storage_key },
            other => StreamError::Storage(other),
        }
    }
}

impl StreamError {
    /// Short machine-stable reason for response bodies and metric labels
    pub fn reason(&self) -> &'static str {
        match self {
            StreamError::Access(AccessError::NotFound) => "post_not_found",
            StreamError::Access(AccessError::Forbidden) => "forbidden",
            StreamError::Access(AccessError::Store(_)) => "access_store_error",
            StreamError::Range(RangeError::NotSatisfiable { .. }) => "range_not_satisfiable",
            StreamError::Range(RangeError::Malformed(_)) => "invalid_range",
            StreamError::BlobMissing { .. } => "video_file_not_found",
            StreamError::Storage(_) => "storage_error",
        }
    }

    /// HTTP status the transport should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            StreamError::Access(AccessError::NotFound) => 404,
            StreamError::Access(AccessError::Forbidden) => 403,
            StreamError::Range(RangeError::NotSatisfiable { .. }) => 416,
            StreamError::Range(RangeError::Malformed(_)) => 400,
            StreamError::BlobMissing { .. } => 404,
            StreamError::Access(AccessError::Store(_)) | StreamError::Storage(_) => 500,
        }
    }
}
