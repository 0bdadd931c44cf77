/// Request extractors resolving the session to a live user row
///
/// The JWT middleware only proves who signed in. These extractors reload the
/// user on every request so deactivation and admin changes apply at once.
use actix_middleware::UserId;
use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use video_core::Identity;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Authenticated, active user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn identity(&self) -> Identity {
        self.0.identity()
    }
}

/// Authenticated, active admin
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

async fn load_current_user(req: HttpRequest) -> Result<User, AppError> {
    let user_id = req
        .extensions()
        .get::<UserId>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("AppState not configured".to_string()))?;

    let user = state
        .users
        .find_user(user_id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "inactive user presented a valid session");
        return Err(AppError::Unauthorized("Inactive user".to_string()));
    }

    Ok(user)
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { load_current_user(req).await.map(CurrentUser) })
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user = load_current_user(req).await?;
            if !user.is_admin {
                tracing::warn!(user_id = %user.id, "non-admin denied admin endpoint");
                return Err(AppError::AdminRequired);
            }
            Ok(AdminUser(user))
        })
    }
}
