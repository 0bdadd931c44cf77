/// Admin handlers - user management, global post listing, dashboard stats
use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::handlers::with_authors;
use crate::middleware::AdminUser;
use crate::models::{AdminStats, AdminUpdateUserRequest, MessageResponse, UserChanges, UserResponse};
use crate::state::AppState;

pub async fn stats(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
    let (total_users, active_users) = state.users.user_counts().await?;
    let (total_posts, public_posts) = state.posts.post_counts().await?;

    Ok(HttpResponse::Ok().json(AdminStats {
        total_users,
        active_users,
        total_posts,
        public_posts,
    }))
}

pub async fn list_users(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
    let users: Vec<UserResponse> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    state: web::Data<AppState>,
    _admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = state
        .users
        .find_user(user_id.into_inner())
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn update_user(
    state: web::Data<AppState>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
    req: web::Json<AdminUpdateUserRequest>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    let req = req.into_inner();
    req.validate()?;

    let existing = state.users.find_user(user_id).await?.ok_or(AppError::UserNotFound)?;

    if user_id == admin.0.id && req.is_admin == Some(false) {
        return Err(AppError::BadRequest(
            "Cannot remove your own admin privileges".to_string(),
        ));
    }

    let changes = UserChanges::from(req);
    if let Some(email) = &changes.email {
        if email != &existing.email {
            if let Some(holder) = state.users.find_user_by_email(email).await? {
                if holder.id != user_id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
        }
    }

    let user = state
        .users
        .update_user(user_id, changes)
        .await?
        .ok_or(AppError::UserNotFound)?;

    tracing::info!(user_id = %user.id, admin_id = %admin.0.id, "user updated by admin");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete a user with their grants, their posts' blobs, and their posts
pub async fn delete_user(
    state: web::Data<AppState>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    if state.users.find_user(user_id).await?.is_none() {
        return Err(AppError::UserNotFound);
    }
    if user_id == admin.0.id {
        return Err(AppError::BadRequest("Cannot delete your own account".to_string()));
    }

    let revoked = state.grants.delete_grants_for_user(user_id).await?;

    let posts = state.posts.list_posts_by_author(user_id).await?;
    for post in &posts {
        state.blobs.delete(&post.video_filename).await?;
        state.posts.delete_post(post.id).await?;
    }

    state.users.delete_user(user_id).await?;

    tracing::info!(
        user_id = %user_id,
        admin_id = %admin.0.id,
        posts_removed = posts.len(),
        grants_removed = revoked,
        "user deleted by admin"
    );
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

pub async fn list_posts(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
    let posts = state.posts.list_all_posts().await?;
    Ok(HttpResponse::Ok().json(with_authors(&state, posts).await?))
}
