/// Auth handlers - registration, login, session introspection, logout
use actix_middleware::SESSION_COOKIE;
use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    web, HttpResponse,
};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{
    normalize_email, LoginRequest, MessageResponse, NewUser, RegisterRequest, TokenResponse,
    UserResponse,
};
use crate::security::{hash_password, verify_password};
use crate::state::AppState;

fn session_cookie(token: String, state: &AppState) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(state.settings.cookie_secure)
        .max_age(Duration::seconds(state.sessions.ttl_seconds()))
        .finish()
}

/// Register a new account
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let email = normalize_email(&req.email);
    if state.users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::EmailAlreadyRegistered);
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .users
        .create_user(NewUser {
            email,
            password_hash,
            full_name: req.full_name.filter(|n| !n.trim().is_empty()),
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Exchange credentials for a session cookie (token also returned in the body)
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let email = normalize_email(&req.email);
    let Some(user) = state.users.find_user_by_email(&email).await? else {
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        tracing::info!(user_id = %user.id, "login rejected: inactive account");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.sessions.issue(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token.clone(), &state))
        .json(TokenResponse::bearer(token)))
}

/// Current user
pub async fn me(user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse::from(user.0)))
}

/// Clear the session cookie; works without a valid session
pub async fn logout() -> HttpResponse {
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();

    HttpResponse::Ok()
        .cookie(removal)
        .json(MessageResponse::new("Successfully logged out"))
}
