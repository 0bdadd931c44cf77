//! Lazy chunked reads over a stored blob

use std::io::SeekFrom;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::StorageError;
use crate::storage::BlobStore;

/// Finite, non-restartable stream of byte chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Stream the inclusive byte interval `[start, end]` of a blob in chunks of at
/// most `chunk_size` bytes.
///
/// Nothing is opened until the stream is first polled. The read handle lives
/// inside the stream, so it is released when the stream finishes or is
/// dropped early (client disconnect, downstream write failure). A blob that
/// turns out shorter than promised fails the stream with `UnexpectedEof`, so
/// the transport aborts instead of ending a response short of its length.
pub fn open_chunks(
    store: Arc<dyn BlobStore>,
    storage_key: String,
    start: u64,
    end: u64,
    chunk_size: usize,
) -> ChunkStream {
    let chunk_size = chunk_size.max(1) as u64;

    Box::pin(try_stream! {
        let mut reader = store.open(&storage_key).await?;
        reader.seek(SeekFrom::Start(start)).await.map_err(StorageError::from)?;

        let mut remaining = (end + 1).saturating_sub(start);
        while remaining > 0 {
            let want = remaining.min(chunk_size) as usize;
            let mut buf = BytesMut::zeroed(want);
            let read = reader.read(&mut buf).await.map_err(StorageError::from)?;
            if read == 0 {
                tracing::warn!(
                    storage_key = %storage_key,
                    remaining,
                    "blob ended before requested range"
                );
                Err::<(), _>(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "blob ended before requested range",
                )))?;
            }
            buf.truncate(read);
            remaining -= read as u64;
            yield buf.freeze();
        }
    })
}

/// A stream that yields nothing (zero-length bodies)
pub fn empty_chunks() -> ChunkStream {
    Box::pin(futures::stream::empty())
}
