/// Shared application state handed to every handler
use std::sync::Arc;

use crypto_core::SessionKeys;
use video_core::{AccessStore, BlobStore, StreamResponder};

use crate::config::Config;
use crate::db::{GrantStore, PostStore, UserStore};

/// Request-handling knobs taken from [`Config`]
#[derive(Debug, Clone)]
pub struct Settings {
    pub cookie_secure: bool,
    pub max_upload_bytes: u64,
    pub stream_chunk_size: usize,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            cookie_secure: config.auth.cookie_secure,
            max_upload_bytes: config.media.max_upload_bytes,
            stream_chunk_size: config.media.stream_chunk_size,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub grants: Arc<dyn GrantStore>,
    pub access: Arc<dyn AccessStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub sessions: Arc<SessionKeys>,
    pub streamer: StreamResponder,
    pub settings: Settings,
}

impl AppState {
    /// Wire every store trait to one backing store
    pub fn new<S>(
        store: Arc<S>,
        blobs: Arc<dyn BlobStore>,
        sessions: Arc<SessionKeys>,
        settings: Settings,
    ) -> Self
    where
        S: UserStore + PostStore + GrantStore + AccessStore + 'static,
    {
        let access: Arc<dyn AccessStore> = store.clone();
        let streamer = StreamResponder::new(access.clone(), blobs.clone())
            .with_chunk_size(settings.stream_chunk_size);

        Self {
            users: store.clone(),
            posts: store.clone(),
            grants: store,
            access,
            blobs,
            sessions,
            streamer,
            settings,
        }
    }
}
