/// Route table for board-service
use std::sync::Arc;

use actix_middleware::JwtAuthMiddleware;
use actix_web::web;
use crypto_core::SessionKeys;

use crate::handlers;

/// Mount every route; `sessions` backs the JWT middleware on protected scopes
pub fn configure(cfg: &mut web::ServiceConfig, sessions: Arc<SessionKeys>) {
    let auth = JwtAuthMiddleware::new(sessions);

    cfg.route("/health", web::get().to(handlers::health::health))
        .route("/metrics", web::get().to(handlers::health::metrics))
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(handlers::auth::register))
                .route("/login", web::post().to(handlers::auth::login))
                .route("/logout", web::post().to(handlers::auth::logout))
                .service(
                    web::resource("/me")
                        .wrap(auth.clone())
                        .route(web::get().to(handlers::auth::me)),
                ),
        )
        .service(
            web::scope("/api/posts")
                .wrap(auth.clone())
                .route("", web::post().to(handlers::posts::create_post))
                .route("", web::get().to(handlers::posts::list_posts))
                .route("/{post_id}", web::get().to(handlers::posts::get_post))
                .route("/{post_id}", web::put().to(handlers::posts::update_post))
                .route("/{post_id}", web::delete().to(handlers::posts::delete_post))
                .route(
                    "/{post_id}/permissions",
                    web::get().to(handlers::permissions::list_permissions),
                )
                .route(
                    "/{post_id}/permissions",
                    web::post().to(handlers::permissions::grant_permission),
                )
                .route(
                    "/{post_id}/permissions/{user_id}",
                    web::delete().to(handlers::permissions::revoke_permission),
                ),
        )
        .service(
            web::scope("/api/stream")
                .wrap(auth.clone())
                .route("/{post_id}", web::get().to(handlers::stream::stream_video)),
        )
        .service(
            web::scope("/api/admin")
                .wrap(auth)
                .route("/stats", web::get().to(handlers::admin::stats))
                .route("/users", web::get().to(handlers::admin::list_users))
                .route("/users/{user_id}", web::get().to(handlers::admin::get_user))
                .route("/users/{user_id}", web::put().to(handlers::admin::update_user))
                .route("/users/{user_id}", web::delete().to(handlers::admin::delete_user))
                .route("/posts", web::get().to(handlers::admin::list_posts)),
        );
}
