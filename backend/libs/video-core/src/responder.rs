//! Builds streaming responses for video posts
//!
//! Combines access resolution, Range parsing and chunked reads into a
//! transport-neutral `{status, headers, body}` triple.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::access::{resolve_read_access, AccessStore};
use crate::chunks::{empty_chunks, open_chunks, ChunkStream};
use crate::constants::{DEFAULT_CHUNK_SIZE, OCTET_STREAM, VIDEO_CONTENT_TYPES};
use crate::error::StreamError;
use crate::models::{file_extension, Identity};
use crate::range::{parse_range, RangeRequest};
use crate::storage::BlobStore;

pub const HEADER_ACCEPT_RANGES: &str = "Accept-Ranges";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HEADER_CONTENT_RANGE: &str = "Content-Range";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// Extension → content type lookup (no content sniffing)
#[derive(Debug, Clone)]
pub struct ContentTypeMap {
    types: HashMap<String, String>,
}

impl Default for ContentTypeMap {
    fn default() -> Self {
        Self {
            types: VIDEO_CONTENT_TYPES
                .iter()
                .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
                .collect(),
        }
    }
}

impl ContentTypeMap {
    /// Content type for a file name, matched case-insensitively on extension
    pub fn resolve(&self, file_name: &str) -> &str {
        file_extension(file_name)
            .and_then(|ext| self.types.get(&ext))
            .map(String::as_str)
            .unwrap_or(OCTET_STREAM)
    }
}

/// Response ready to be framed by the HTTP transport
pub struct StreamResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: ChunkStream,
}

impl StreamResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Orchestrates access checks and byte-range streaming
///
/// Holds no per-request state; each call builds a fresh body stream.
#[derive(Clone)]
pub struct StreamResponder {
    access: Arc<dyn AccessStore>,
    blobs: Arc<dyn BlobStore>,
    content_types: ContentTypeMap,
    chunk_size: usize,
}

impl StreamResponder {
    pub fn new(access: Arc<dyn AccessStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            access,
            blobs,
            content_types: ContentTypeMap::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_content_types(mut self, content_types: ContentTypeMap) -> Self {
        self.content_types = content_types;
        self
    }

    /// Build the response for streaming `resource_id` to `identity`.
    ///
    /// Access is evaluated once here, not re-checked while the body streams.
    pub async fn build_stream_response(
        &self,
        resource_id: Uuid,
        identity: &Identity,
        range_header: Option<&str>,
    ) -> Result<StreamResponse, StreamError> {
        let resource = resolve_read_access(self.access.as_ref(), resource_id, identity).await?;

        if !self.blobs.exists(&resource.storage_key).await? {
            tracing::warn!(
                resource_id = %resource.id,
                storage_key = %resource.storage_key,
                "post metadata exists but video blob is missing"
            );
            return Err(StreamError::BlobMissing {
                storage_key: resource.storage_key,
            });
        }

        let total = resource.byte_length;
        let content_type = self.content_types.resolve(&resource.original_name).to_string();
        let range = parse_range(range_header, total)?;

        let response = match range {
            RangeRequest::FullBody { total } => {
                let body = if total == 0 {
                    empty_chunks()
                } else {
                    open_chunks(
                        self.blobs.clone(),
                        resource.storage_key.clone(),
                        0,
                        total - 1,
                        self.chunk_size,
                    )
                };
                StreamResponse {
                    status: 200,
                    headers: vec![
                        (HEADER_ACCEPT_RANGES, "bytes".to_string()),
                        (HEADER_CONTENT_LENGTH, total.to_string()),
                        (HEADER_CONTENT_TYPE, content_type),
                    ],
                    body,
                }
            }
            RangeRequest::Partial(range) => StreamResponse {
                status: 206,
                headers: vec![
                    (HEADER_CONTENT_RANGE, range.content_range()),
                    (HEADER_ACCEPT_RANGES, "bytes".to_string()),
                    (HEADER_CONTENT_LENGTH, range.len().to_string()),
                    (HEADER_CONTENT_TYPE, content_type),
                ],
                body: open_chunks(
                    self.blobs.clone(),
                    resource.storage_key.clone(),
                    range.start,
                    range.end,
                    self.chunk_size,
                ),
            },
        };

        tracing::debug!(
            resource_id = %resource.id,
            identity_id = %identity.id,
            status = response.status,
            "video stream started"
        );

        Ok(response)
    }
}
