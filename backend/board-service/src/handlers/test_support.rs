//! Shared fixtures for handler tests: an app wired to in-memory stores,
//! plus helpers for logging in and uploading videos over HTTP.

use std::sync::Arc;

use actix_middleware::SESSION_COOKIE;
use actix_web::{
    body::{BoxBody, MessageBody},
    cookie::Cookie,
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    http::{header, StatusCode},
    test, web, App,
};
use crypto_core::SessionKeys;
use serde_json::{json, Value};
use uuid::Uuid;
use video_core::{BlobStore, MemoryBlobStore};

use crate::db::memory::MemoryStore;
use crate::db::UserStore;
use crate::models::UserChanges;
use crate::routes;
use crate::state::{AppState, Settings};

const TEST_SECRET: &str = "test-secret-key-that-is-at-least-32-bytes";
const TEST_PASSWORD: &str = "password1";
const BOUNDARY: &str = "----board-service-test-boundary";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub blobs: MemoryBlobStore,
    pub sessions: Arc<SessionKeys>,
    pub settings: Settings,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_upload_limit(10 * 1024 * 1024)
    }

    pub fn with_upload_limit(max_upload_bytes: u64) -> Self {
        let sessions = SessionKeys::new(TEST_SECRET, 30).expect("test session keys");
        Self {
            store: Arc::new(MemoryStore::new()),
            blobs: MemoryBlobStore::new(),
            sessions: Arc::new(sessions),
            settings: Settings {
                cookie_secure: false,
                max_upload_bytes,
                // Small chunks so multi-chunk streaming is exercised
                stream_chunk_size: 64 * 1024,
            },
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.store.clone(),
            Arc::new(self.blobs.clone()),
            self.sessions.clone(),
            self.settings.clone(),
        )
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<BoxBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let sessions = self.sessions.clone();
        App::new()
            .app_data(web::Data::new(self.state()))
            .configure(move |cfg| routes::configure(cfg, sessions))
    }

    pub async fn deactivate(&self, user_id: Uuid) {
        self.change_user(
            user_id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn promote(&self, user_id: Uuid) {
        self.change_user(
            user_id,
            UserChanges {
                is_admin: Some(true),
                ..Default::default()
            },
        )
        .await;
    }

    pub async fn remove_blob(&self, key: &str) {
        self.blobs.delete(key).await.expect("blob removed");
    }

    async fn change_user(&self, user_id: Uuid, changes: UserChanges) {
        self.store
            .update_user(user_id, changes)
            .await
            .expect("user update")
            .expect("user exists");
    }
}

/// Session cookie set (or cleared) by a response
pub fn session_cookie_from<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

/// Register `email` with a fixed password and log in; returns the user id
/// and the session cookie
pub async fn register_and_login<S, B>(app: &S, email: &str) -> (Uuid, Cookie<'static>)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"email": email, "password": TEST_PASSWORD}))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "register {email}");
    let user: Value = test::read_body_json(resp).await;
    let user_id: Uuid = user["id"].as_str().and_then(|s| s.parse().ok()).expect("user id");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": email, "password": TEST_PASSWORD}))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "login {email}");
    let cookie = session_cookie_from(&resp).expect("session cookie");

    (user_id, cookie)
}

fn multipart_body(title: &str, is_public: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("title", title), ("is_public", is_public)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart upload to `/api/posts`
pub async fn upload_video<S, B>(
    app: &S,
    cookie: &Cookie<'static>,
    title: &str,
    is_public: &str,
    filename: &str,
    data: &[u8],
) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/posts")
        .cookie(cookie.clone())
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(title, is_public, filename, data))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
