//! Video board streaming core
//!
//! Access resolution, HTTP Range parsing, chunked blob reads and the stream
//! responder that ties them together. Transport-neutral: the HTTP service
//! frames [`StreamResponse`] however its framework wants.

pub mod access;
pub mod chunks;
pub mod constants;
pub mod error;
pub mod models;
pub mod range;
pub mod responder;
pub mod storage;

pub use access::{
    resolve_management_access, resolve_read_access, AccessRule, AccessStore, MANAGE_RULES,
    READ_RULES,
};
pub use chunks::{open_chunks, ChunkStream};
pub use error::{AccessError, RangeError, StorageError, StreamError};
pub use models::*;
pub use range::{parse_range, RangeRequest};
pub use responder::{ContentTypeMap, StreamResponder, StreamResponse};
pub use storage::{BlobStore, LocalBlobStore, MemoryBlobStore};
