//! Persistence for users, posts and grants
//!
//! Handlers talk to the traits below; [`PgStore`] implements all of them
//! (plus the streaming core's `AccessStore`) over one Postgres pool.

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use uuid::Uuid;
use video_core::GrantType;

use crate::error::Result;
use crate::models::{NewPost, NewUser, Post, PostChanges, PostPermission, User, UserChanges};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; `EmailAlreadyRegistered` if the email is taken
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users with the given ids, in no particular order
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// All users, newest first
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Apply changes; `Conflict` if the new email belongs to someone else
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;

    /// Delete a user; their posts and grants go with them
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    /// Promote an existing account to admin
    async fn promote_admin(&self, email: &str) -> Result<bool>;

    /// (total, active)
    async fn user_counts(&self) -> Result<(i64, i64)>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Every post, newest first
    async fn list_all_posts(&self) -> Result<Vec<Post>>;

    /// Posts the user owns, public posts, and posts granted to the user; newest first
    async fn list_readable_posts(&self, user_id: Uuid) -> Result<Vec<Post>>;

    async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>>;

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    /// Delete a post row; its grants go with it
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    /// (total, public)
    async fn post_counts(&self) -> Result<(i64, i64)>;
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Record a grant; `PermissionExists` if the pair already has one
    async fn create_grant(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        grant_type: GrantType,
    ) -> Result<PostPermission>;

    /// Grants on a post, oldest first
    async fn list_grants(&self, post_id: Uuid) -> Result<Vec<PostPermission>>;

    async fn delete_grant(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Remove every grant held by a user, returning how many went
    async fn delete_grants_for_user(&self, user_id: Uuid) -> Result<u64>;
}
