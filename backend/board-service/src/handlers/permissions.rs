/// Permission handlers - explicit read grants on a post
///
/// Every endpoint requires management access (owner or admin).
use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use uuid::Uuid;
use video_core::{resolve_management_access, GrantType};

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{normalize_email, GrantPermissionRequest, MessageResponse, PermissionResponse, UserResponse};
use crate::state::AppState;

pub async fn list_permissions(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    resolve_management_access(state.access.as_ref(), post_id, &user.identity()).await?;

    let grants = state.grants.list_grants(post_id).await?;
    let user_ids: Vec<Uuid> = grants.iter().map(|g| g.user_id).collect();
    let users: HashMap<Uuid, UserResponse> = state
        .users
        .find_users(&user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, UserResponse::from(u)))
        .collect();

    let responses: Vec<PermissionResponse> = grants
        .into_iter()
        .filter_map(|grant| {
            let user = users.get(&grant.user_id)?.clone();
            Some(PermissionResponse::new(grant, user))
        })
        .collect();

    Ok(HttpResponse::Ok().json(responses))
}

pub async fn grant_permission(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
    req: web::Json<GrantPermissionRequest>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    resolve_management_access(state.access.as_ref(), post_id, &user.identity()).await?;

    let req = req.into_inner();
    let grant_type = GrantType::parse(&req.permission_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown permission type: {}", req.permission_type))
    })?;

    let target = match (req.user_id, req.user_identifier.as_deref()) {
        (Some(id), _) => state.users.find_user(id).await?,
        (None, Some(identifier)) => state.users.find_user_by_email(&normalize_email(identifier)).await?,
        (None, None) => None,
    }
    .ok_or(AppError::UserNotFound)?;

    let grant = state.grants.create_grant(post_id, target.id, grant_type).await?;

    tracing::info!(
        post_id = %post_id,
        grantee_id = %target.id,
        granted_by = %user.0.id,
        "read permission granted"
    );
    Ok(HttpResponse::Created().json(PermissionResponse::new(grant, target.into())))
}

pub async fn revoke_permission(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, target_id) = path.into_inner();
    resolve_management_access(state.access.as_ref(), post_id, &user.identity()).await?;

    if !state.grants.delete_grant(post_id, target_id).await? {
        return Err(AppError::PermissionNotFound);
    }

    tracing::info!(post_id = %post_id, grantee_id = %target_id, "read permission revoked");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Permission removed successfully")))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{register_and_login, upload_video, TestApp};
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    #[actix_web::test]
    async fn test_grant_list_revoke_cycle() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let (_, owner) = register_and_login(&app, "owner@example.com").await;
        let (viewer_id, viewer) = register_and_login(&app, "viewer@example.com").await;

        let (_, post) = upload_video(&app, &owner, "private", "false", "a.webm", b"data").await;
        let post_id = post["id"].as_str().unwrap().to_string();
        let perms_uri = format!("/api/posts/{}/permissions", post_id);
        let post_uri = format!("/api/posts/{}", post_id);

        let req = test::TestRequest::get().uri(&post_uri).cookie(viewer.clone()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        // Grant by email, case-insensitively
        let req = test::TestRequest::post()
            .uri(&perms_uri)
            .cookie(owner.clone())
            .set_json(json!({"user_identifier": "Viewer@Example.com"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["permission_type"], "read");
        assert_eq!(body["user"]["email"], "viewer@example.com");

        let req = test::TestRequest::get().uri(&post_uri).cookie(viewer.clone()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // Second grant for the same pair conflicts
        let req = test::TestRequest::post()
            .uri(&perms_uri)
            .cookie(owner.clone())
            .set_json(json!({"user_id": viewer_id}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get().uri(&perms_uri).cookie(owner.clone()).to_request();
        let listed: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["user_id"], viewer_id.to_string());

        let revoke_uri = format!("{}/{}", perms_uri, viewer_id);
        let req = test::TestRequest::delete().uri(&revoke_uri).cookie(owner.clone()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // Revocation applies to the very next request
        let req = test::TestRequest::get().uri(&post_uri).cookie(viewer).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete().uri(&revoke_uri).cookie(owner).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_grant_errors() {
        let ctx = TestApp::new();
        let app = test::init_service(ctx.app()).await;
        let (_, owner) = register_and_login(&app, "owner@example.com").await;
        let (_, other) = register_and_login(&app, "other@example.com").await;

        let (_, post) = upload_video(&app, &owner, "p", "true", "a.mp4", b"x").await;
        let perms_uri = format!("/api/posts/{}/permissions", post["id"].as_str().unwrap());

        let req = test::TestRequest::post()
            .uri(&perms_uri)
            .cookie(owner.clone())
            .set_json(json!({"user_identifier": "ghost@example.com"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri(&perms_uri)
            .cookie(owner)
            .set_json(json!({"user_identifier": "other@example.com", "permission_type": "write"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        // Readers of a public post still cannot manage its grants
        let req = test::TestRequest::get().uri(&perms_uri).cookie(other).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
