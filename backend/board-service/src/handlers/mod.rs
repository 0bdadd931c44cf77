/// HTTP handlers for board-service
pub mod admin;
pub mod auth;
pub mod health;
pub mod permissions;
pub mod posts;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{Post, PostResponse, UserResponse};
use crate::state::AppState;

/// Attach each post's author, loading all authors in one query
pub(crate) async fn with_authors(state: &AppState, posts: Vec<Post>) -> Result<Vec<PostResponse>> {
    let mut author_ids: Vec<_> = posts.iter().map(|p| p.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<_, _> = state
        .users
        .find_users(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, UserResponse::from(u)))
        .collect();

    posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("author of post {} missing", post.id)))?;
            Ok(PostResponse::new(post, author))
        })
        .collect()
}

/// Single-post variant of [`with_authors`]
pub(crate) async fn with_author(state: &AppState, post: Post) -> Result<PostResponse> {
    let author = state
        .users
        .find_user(post.author_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("author of post {} missing", post.id)))?;
    Ok(PostResponse::new(post, author.into()))
}
