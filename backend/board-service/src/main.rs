/// Board Service - HTTP Server
///
/// Serves the auth, posts, permissions, stream and admin APIs.
use std::sync::Arc;

use actix_cors::Cors;
use actix_middleware::MetricsMiddleware;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::Context;
use board_service::db::{PgStore, UserStore, MIGRATOR};
use board_service::routes;
use board_service::state::{AppState, Settings};
use board_service::Config;
use crypto_core::SessionKeys;
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use video_core::LocalBlobStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,board_service=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::RANGE])
        .expose_headers(vec![header::CONTENT_RANGE, header::ACCEPT_RANGES, header::CONTENT_LENGTH])
        .supports_credentials()
        .max_age(3600);

    config
        .cors
        .allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(env = %config.app.env, "board-service starting");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("database migrations applied");

    let store = Arc::new(PgStore::new(pool));

    if let Some(email) = config.auth.bootstrap_admin_email.as_deref() {
        if store.promote_admin(email).await? {
            tracing::info!(email = %email, "bootstrap admin promoted");
        } else {
            tracing::warn!(email = %email, "bootstrap admin email has no account yet");
        }
    }

    let blobs = LocalBlobStore::new(&config.media.upload_dir)
        .await
        .context("Failed to prepare upload directory")?;
    let sessions = Arc::new(
        SessionKeys::new(&config.auth.jwt_secret, config.auth.access_token_ttl_minutes)
            .context("Invalid JWT configuration")?,
    );

    let state = AppState::new(store, Arc::new(blobs), sessions.clone(), Settings::from(&config));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(address = %bind_address, "starting HTTP server");

    HttpServer::new(move || {
        let sessions = sessions.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .wrap(cors(&config))
            .configure(move |cfg| routes::configure(cfg, sessions))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    tracing::info!("board-service shutting down");
    Ok(())
}
