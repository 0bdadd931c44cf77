/// Data models for board-service
///
/// This module defines structures for:
/// - User: registered accounts and their public projection
/// - Post: a video upload with its visibility
/// - PostPermission: explicit read grants on a post
///
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use video_core::{Identity, Resource};

// ========================================
// User Models
// ========================================

/// User database entity
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.is_admin)
    }
}

/// Fields for inserting a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

/// Partial update applied by admins; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

/// User as exposed over the API (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

// ========================================
// Post Models
// ========================================

/// Post database entity
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Storage key of the video blob
    pub video_filename: String,
    pub video_original_name: String,
    pub video_size: i64,
    pub author_id: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Access-control view of this post
    pub fn resource(&self) -> Resource {
        Resource {
            id: self.id,
            owner_id: self.author_id,
            is_public: self.is_public,
            storage_key: self.video_filename.clone(),
            original_name: self.video_original_name.clone(),
            byte_length: u64::try_from(self.video_size).unwrap_or(0),
        }
    }
}

/// Fields for inserting a post after its blob has been written
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: Option<String>,
    pub video_filename: String,
    pub video_original_name: String,
    pub video_size: i64,
    pub author_id: Uuid,
    pub is_public: bool,
}

/// Partial post update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_filename: String,
    pub video_original_name: String,
    pub video_size: i64,
    pub author_id: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub author: UserResponse,
}

impl PostResponse {
    pub fn new(post: Post, author: UserResponse) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            video_filename: post.video_filename,
            video_original_name: post.video_original_name,
            video_size: post.video_size,
            author_id: post.author_id,
            is_public: post.is_public,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author,
        }
    }
}

// ========================================
// Permission Models
// ========================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostPermission {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub permission_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub permission_type: String,
    pub created_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl PermissionResponse {
    pub fn new(permission: PostPermission, user: UserResponse) -> Self {
        Self {
            id: permission.id,
            post_id: permission.post_id,
            user_id: permission.user_id,
            permission_type: permission.permission_type,
            created_at: permission.created_at,
            user,
        }
    }
}

// ========================================
// Request / Response DTOs
// ========================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 255))]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl From<UpdatePostRequest> for PostChanges {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            is_public: req.is_public,
        }
    }
}

/// Grant request; the target is named by id or by email
#[derive(Debug, Clone, Deserialize)]
pub struct GrantPermissionRequest {
    pub user_id: Option<Uuid>,
    pub user_identifier: Option<String>,
    #[serde(default = "default_permission_type")]
    pub permission_type: String,
}

fn default_permission_type() -> String {
    "read".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

impl From<AdminUpdateUserRequest> for UserChanges {
    fn from(req: AdminUpdateUserRequest) -> Self {
        Self {
            email: req.email.map(|e| normalize_email(&e)),
            full_name: req.full_name,
            is_active: req.is_active,
            is_admin: req.is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_posts: i64,
    pub public_posts: i64,
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
