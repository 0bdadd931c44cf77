//! In-memory stores for handler tests
//!
//! Mirrors the Postgres constraints that handlers rely on: unique emails,
//! unique (post, user) grants, and cascading deletes.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;
use video_core::{AccessError, AccessStore, GrantType, Resource};

use super::{GrantStore, PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{NewPost, NewUser, Post, PostChanges, PostPermission, User, UserChanges};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    grants: Vec<PostPermission>,
    /// Monotonic clock so "newest first" is deterministic within a test
    tick: i64,
}

impl Tables {
    fn now(&mut self) -> chrono::DateTime<Utc> {
        self.tick += 1;
        Utc::now() + Duration::milliseconds(self.tick)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut t = self.tables();
        if t.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::EmailAlreadyRegistered);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            is_active: true,
            is_admin: false,
            created_at: t.now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.tables().users.clone();
        Ok(newest_first(users, |u| u.created_at))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let mut t = self.tables();
        if let Some(email) = &changes.email {
            if t.users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        let owned: Vec<Uuid> = t
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        t.posts.retain(|p| p.author_id != id);
        t.grants
            .retain(|g| g.user_id != id && !owned.contains(&g.post_id));
        Ok(true)
    }

    async fn promote_admin(&self, email: &str) -> Result<bool> {
        let mut t = self.tables();
        match t.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.is_admin = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn user_counts(&self) -> Result<(i64, i64)> {
        let t = self.tables();
        let active = t.users.iter().filter(|u| u.is_active).count();
        Ok((t.users.len() as i64, active as i64))
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut t = self.tables();
        let post = Post {
            id: Uuid::new_v4(),
            title: new_post.title,
            description: new_post.description,
            video_filename: new_post.video_filename,
            video_original_name: new_post.video_original_name,
            video_size: new_post.video_size,
            author_id: new_post.author_id,
            is_public: new_post.is_public,
            created_at: t.now(),
            updated_at: None,
        };
        t.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>> {
        let posts = self.tables().posts.clone();
        Ok(newest_first(posts, |p| p.created_at))
    }

    async fn list_readable_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let t = self.tables();
        let posts = t
            .posts
            .iter()
            .filter(|p| {
                p.author_id == user_id
                    || p.is_public
                    || t.grants.iter().any(|g| g.post_id == p.id && g.user_id == user_id)
            })
            .cloned()
            .collect();
        Ok(newest_first(posts, |p| p.created_at))
    }

    async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let posts = self
            .tables()
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        Ok(newest_first(posts, |p| p.created_at))
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let mut t = self.tables();
        let now = t.now();
        let Some(post) = t.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(description) = changes.description {
            post.description = Some(description);
        }
        if let Some(is_public) = changes.is_public {
            post.is_public = is_public;
        }
        post.updated_at = Some(now);
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables();
        let before = t.posts.len();
        t.posts.retain(|p| p.id != id);
        t.grants.retain(|g| g.post_id != id);
        Ok(t.posts.len() < before)
    }

    async fn post_counts(&self) -> Result<(i64, i64)> {
        let t = self.tables();
        let public = t.posts.iter().filter(|p| p.is_public).count();
        Ok((t.posts.len() as i64, public as i64))
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn create_grant(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        grant_type: GrantType,
    ) -> Result<PostPermission> {
        let mut t = self.tables();
        if t.grants.iter().any(|g| g.post_id == post_id && g.user_id == user_id) {
            return Err(AppError::PermissionExists);
        }
        let grant = PostPermission {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            permission_type: grant_type.as_str().to_string(),
            created_at: t.now(),
        };
        t.grants.push(grant.clone());
        Ok(grant)
    }

    async fn list_grants(&self, post_id: Uuid) -> Result<Vec<PostPermission>> {
        Ok(self
            .tables()
            .grants
            .iter()
            .filter(|g| g.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn delete_grant(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut t = self.tables();
        let before = t.grants.len();
        t.grants
            .retain(|g| !(g.post_id == post_id && g.user_id == user_id));
        Ok(t.grants.len() < before)
    }

    async fn delete_grants_for_user(&self, user_id: Uuid) -> Result<u64> {
        let mut t = self.tables();
        let before = t.grants.len();
        t.grants.retain(|g| g.user_id != user_id);
        Ok((before - t.grants.len()) as u64)
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn find_resource(
        &self,
        resource_id: Uuid,
    ) -> std::result::Result<Option<Resource>, AccessError> {
        Ok(self
            .tables()
            .posts
            .iter()
            .find(|p| p.id == resource_id)
            .map(Post::resource))
    }

    async fn grant_exists(
        &self,
        resource_id: Uuid,
        identity_id: Uuid,
    ) -> std::result::Result<bool, AccessError> {
        Ok(self
            .tables()
            .grants
            .iter()
            .any(|g| g.post_id == resource_id && g.user_id == identity_id))
    }
}
