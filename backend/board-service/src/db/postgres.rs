/// Postgres implementation of the board stores
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use video_core::{AccessError, AccessStore, GrantType, Resource};

use super::{GrantStore, PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{NewPost, NewUser, Post, PostChanges, PostPermission, User, UserChanges};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, is_active, is_admin, created_at";

const POST_COLUMNS: &str = "id, title, description, video_filename, video_original_name, \
     video_size, author_id, is_public, created_at, updated_at";

const PERMISSION_COLUMNS: &str = "id, post_id, user_id, permission_type, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, full_name, is_active, is_admin, created_at) \
             VALUES ($1, $2, $3, $4, TRUE, FALSE, NOW()) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::EmailAlreadyRegistered
            } else {
                AppError::from(e)
            }
        })
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                 email = COALESCE($2, email), \
                 full_name = COALESCE($3, full_name), \
                 is_active = COALESCE($4, is_active), \
                 is_admin = COALESCE($5, is_admin) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.full_name)
        .bind(changes.is_active)
        .bind(changes.is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::from(e)
            }
        })
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn promote_admin(&self, email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_counts(&self) -> Result<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM users",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (id, title, description, video_filename, video_original_name, \
             video_size, author_id, is_public, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_post.title)
        .bind(&new_post.description)
        .bind(&new_post.video_filename)
        .bind(&new_post.video_original_name)
        .bind(new_post.video_size)
        .bind(new_post.author_id)
        .bind(new_post.is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn list_readable_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        // (post_id, user_id) is unique, so the join adds at most one row per post
        let posts = sqlx::query_as::<_, Post>(
            "SELECT p.id, p.title, p.description, p.video_filename, p.video_original_name, \
                    p.video_size, p.author_id, p.is_public, p.created_at, p.updated_at \
             FROM posts p \
             LEFT JOIN post_permissions pp ON pp.post_id = p.id AND pp.user_id = $1 \
             WHERE p.author_id = $1 OR p.is_public OR pp.id IS NOT NULL \
             ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 is_public = COALESCE($4, is_public), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.is_public)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn post_counts(&self) -> Result<(i64, i64)> {
        let counts: (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(*) FILTER (WHERE is_public) FROM posts")
                .fetch_one(&self.pool)
                .await?;
        Ok(counts)
    }
}

#[async_trait]
impl GrantStore for PgStore {
    async fn create_grant(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        grant_type: GrantType,
    ) -> Result<PostPermission> {
        sqlx::query_as::<_, PostPermission>(&format!(
            "INSERT INTO post_permissions (id, post_id, user_id, permission_type, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING {PERMISSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(user_id)
        .bind(grant_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::PermissionExists
            } else {
                AppError::from(e)
            }
        })
    }

    async fn list_grants(&self, post_id: Uuid) -> Result<Vec<PostPermission>> {
        let grants = sqlx::query_as::<_, PostPermission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM post_permissions \
             WHERE post_id = $1 ORDER BY created_at ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(grants)
    }

    async fn delete_grant(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_permissions WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_grants_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM post_permissions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Access checks read live rows on every call, so revocations apply immediately
#[async_trait]
impl AccessStore for PgStore {
    async fn find_resource(&self, resource_id: Uuid) -> std::result::Result<Option<Resource>, AccessError> {
        self.find_post(resource_id)
            .await
            .map(|post| post.map(|p| p.resource()))
            .map_err(|e| AccessError::Store(e.to_string()))
    }

    async fn grant_exists(
        &self,
        resource_id: Uuid,
        identity_id: Uuid,
    ) -> std::result::Result<bool, AccessError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM post_permissions WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(resource_id)
        .bind(identity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AccessError::Store(e.to_string()))
    }
}
