//! End-to-end checks of the stream responder against in-memory collaborators

use std::collections::{HashMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};
use uuid::Uuid;
use video_core::storage::{BlobReader, BlobWriter, StorageResult};
use video_core::{
    AccessError, AccessStore, BlobStore, Identity, MemoryBlobStore, RangeError, Resource,
    StorageError, StreamError, StreamResponder, StreamResponse,
};

const ONE_MIB: usize = 1_048_576;

#[derive(Default)]
struct Board {
    posts: RwLock<HashMap<Uuid, Resource>>,
    grants: RwLock<HashSet<(Uuid, Uuid)>>,
}

#[async_trait]
impl AccessStore for Board {
    async fn find_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, AccessError> {
        Ok(self.posts.read().unwrap().get(&resource_id).cloned())
    }

    async fn grant_exists(&self, resource_id: Uuid, identity_id: Uuid) -> Result<bool, AccessError> {
        Ok(self.grants.read().unwrap().contains(&(resource_id, identity_id)))
    }
}

/// Blob store that counts read handles currently open
struct CountingBlobs {
    inner: MemoryBlobStore,
    open: Arc<AtomicUsize>,
}

struct CountedReader {
    inner: BlobReader,
    open: Arc<AtomicUsize>,
}

impl Drop for CountedReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AsyncRead for CountedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncSeek for CountedReader {
    fn start_seek(mut self: Pin<&mut Self>, position: io::SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.inner).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.inner).poll_complete(cx)
    }
}

#[async_trait]
impl BlobStore for CountingBlobs {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn open(&self, key: &str) -> StorageResult<BlobReader> {
        let inner = self.inner.open(key).await?;
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedReader {
            inner,
            open: self.open.clone(),
        }))
    }

    async fn create(&self, key: &str) -> StorageResult<BlobWriter> {
        self.inner.create(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }
}

struct Fixture {
    board: Arc<Board>,
    blobs: MemoryBlobStore,
    responder: StreamResponder,
    owner: Identity,
    stranger: Identity,
    post_id: Uuid,
    data: Vec<u8>,
}

fn fixture(len: usize, is_public: bool) -> Fixture {
    let board = Arc::new(Board::default());
    let blobs = MemoryBlobStore::new();
    let owner = Identity::new(Uuid::new_v4(), false);
    let stranger = Identity::new(Uuid::new_v4(), false);
    let data: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();

    let post = Resource {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        is_public,
        storage_key: format!("{}.mp4", Uuid::new_v4()),
        original_name: "Holiday.MP4".to_string(),
        byte_length: len as u64,
    };
    blobs.insert(post.storage_key.clone(), data.clone());
    let post_id = post.id;
    board.posts.write().unwrap().insert(post.id, post);

    let access: Arc<dyn AccessStore> = board.clone();
    let store: Arc<dyn BlobStore> = Arc::new(blobs.clone());
    let responder = StreamResponder::new(access, store).with_chunk_size(64 * 1024);

    Fixture {
        board,
        blobs,
        responder,
        owner,
        stranger,
        post_id,
        data,
    }
}

async fn body_of(response: StreamResponse) -> Vec<u8> {
    let chunks: Vec<Bytes> = response.body.map(|chunk| chunk.unwrap()).collect().await;
    chunks.concat()
}

#[tokio::test]
async fn owner_gets_full_body_with_headers() {
    let fx = fixture(ONE_MIB, false);
    let response = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, None)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("accept-ranges"), Some("bytes"));
    assert_eq!(response.header("content-length"), Some("1048576"));
    assert_eq!(response.header("content-type"), Some("video/mp4"));
    assert_eq!(response.header("content-range"), None);
    assert_eq!(body_of(response).await, fx.data);
}

#[tokio::test]
async fn partial_range_returns_206() {
    let fx = fixture(1000, true);
    let response = fx
        .responder
        .build_stream_response(fx.post_id, &fx.stranger, Some("bytes=10-19"))
        .await
        .unwrap();

    assert_eq!(response.status, 206);
    assert_eq!(response.header("content-range"), Some("bytes 10-19/1000"));
    assert_eq!(response.header("content-length"), Some("10"));
    assert_eq!(body_of(response).await, &fx.data[10..=19]);
}

#[tokio::test]
async fn grant_turns_forbidden_into_success() {
    let fx = fixture(ONE_MIB, false);

    let denied = fx
        .responder
        .build_stream_response(fx.post_id, &fx.stranger, None)
        .await
        .unwrap_err();
    assert!(matches!(denied, StreamError::Access(AccessError::Forbidden)));

    fx.board
        .grants
        .write()
        .unwrap()
        .insert((fx.post_id, fx.stranger.id));

    let full = fx
        .responder
        .build_stream_response(fx.post_id, &fx.stranger, None)
        .await
        .unwrap();
    assert_eq!(full.status, 200);

    let partial = fx
        .responder
        .build_stream_response(fx.post_id, &fx.stranger, Some("bytes=0-"))
        .await
        .unwrap();
    assert_eq!(partial.status, 206);
    assert_eq!(partial.header("content-range"), Some("bytes 0-1048575/1048576"));
}

#[tokio::test]
async fn start_past_end_is_not_satisfiable() {
    let fx = fixture(ONE_MIB, false);
    let err = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, Some("bytes=2000000-"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StreamError::Range(RangeError::NotSatisfiable { total: 1_048_576 })
    ));
    assert_eq!(err.status_code(), 416);
}

#[tokio::test]
async fn malformed_range_is_bad_request() {
    let fx = fixture(100, false);
    let err = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, Some("bytes=abc-"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.reason(), "invalid_range");
}

#[tokio::test]
async fn missing_blob_is_reported_distinctly() {
    let fx = fixture(100, false);
    let key = fx
        .board
        .posts
        .read()
        .unwrap()
        .get(&fx.post_id)
        .unwrap()
        .storage_key
        .clone();
    fx.blobs.delete(&key).await.unwrap();

    let err = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::BlobMissing { storage_key } if storage_key == key));

    let err = fx
        .responder
        .build_stream_response(Uuid::new_v4(), &fx.owner, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::Access(AccessError::NotFound)));
}

#[tokio::test]
async fn repeated_calls_are_identical() {
    let fx = fixture(5000, false);
    let first = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, Some("bytes=100-4999"))
        .await
        .unwrap();
    let second = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, Some("bytes=100-4999"))
        .await
        .unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.headers, second.headers);
    assert_eq!(body_of(first).await, body_of(second).await);
}

/// Responder over the fixture's blobs that tracks open read handles
fn counting_responder(fx: &Fixture) -> (StreamResponder, Arc<AtomicUsize>) {
    let open = Arc::new(AtomicUsize::new(0));
    let store: Arc<dyn BlobStore> = Arc::new(CountingBlobs {
        inner: fx.blobs.clone(),
        open: open.clone(),
    });
    let access: Arc<dyn AccessStore> = fx.board.clone();
    let responder = StreamResponder::new(access, store).with_chunk_size(64 * 1024);
    (responder, open)
}

#[tokio::test]
async fn read_handle_released_when_body_dropped_early() {
    let fx = fixture(ONE_MIB, false);
    let (responder, open) = counting_responder(&fx);

    let mut response = responder
        .build_stream_response(fx.post_id, &fx.owner, None)
        .await
        .unwrap();
    assert_eq!(open.load(Ordering::SeqCst), 0, "nothing opened before first poll");

    let first = response.body.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 64 * 1024);
    assert_eq!(open.load(Ordering::SeqCst), 1);

    drop(response);
    assert_eq!(open.load(Ordering::SeqCst), 0);

    // A fresh request is unaffected by the abandoned one
    let again = responder
        .build_stream_response(fx.post_id, &fx.owner, Some("bytes=0-0"))
        .await
        .unwrap();
    assert_eq!(body_of(again).await, vec![fx.data[0]]);
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn read_handle_released_when_body_exhausted() {
    let fx = fixture(200_000, false);
    let (responder, open) = counting_responder(&fx);

    let mut response = responder
        .build_stream_response(fx.post_id, &fx.owner, Some("bytes=1000-"))
        .await
        .unwrap();

    let mut received = 0;
    while let Some(chunk) = response.body.next().await {
        received += chunk.unwrap().len();
    }
    assert_eq!(received, 199_000);
    // Stream still alive but finished: the handle must already be gone
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn truncated_blob_surfaces_error_and_releases_handle() {
    let fx = fixture(1000, false);
    let (responder, open) = counting_responder(&fx);
    let key = fx.board.posts.read().unwrap()[&fx.post_id].storage_key.clone();
    fx.blobs.insert(key, vec![7u8; 10]);

    let response = responder
        .build_stream_response(fx.post_id, &fx.owner, None)
        .await
        .unwrap();
    assert_eq!(response.header("content-length"), Some("1000"));

    let items: Vec<Result<Bytes, StorageError>> = response.body.collect().await;
    let delivered: usize = items.iter().filter_map(|i| i.as_ref().ok()).map(Bytes::len).sum();
    assert_eq!(delivered, 10);
    assert!(matches!(
        items.last(),
        Some(Err(StorageError::Io(e))) if e.kind() == io::ErrorKind::UnexpectedEof
    ));
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_blob_streams_nothing() {
    let fx = fixture(0, false);
    let response = fx
        .responder
        .build_stream_response(fx.post_id, &fx.owner, None)
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-length"), Some("0"));
    assert!(body_of(response).await.is_empty());
}
