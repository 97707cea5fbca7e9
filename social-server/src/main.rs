mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing::{info, warn};

use application::auth_service::AuthService;
use application::comment_service::CommentService;
use application::post_service::PostService;
use application::user_service::UserService;
use data::comment_repository::PostgresCommentRepository;
use data::follow_repository::PostgresFollowRepository;
use data::post_repository::PostgresPostRepository;
use data::user_repository::PostgresUserRepository;
use infrastructure::config::{AppConfig, load_env_file};
use infrastructure::credentials::CredentialCodec;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use presentation::handlers;
use presentation::middleware::{RequestIdMiddleware, TimingMiddleware};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file();
    init_logging();
    match env_file {
        Some(path) => info!(path = %path.display(), "loaded .env file"),
        None => warn!(".env file not found, using process environment"),
    }

    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let codec = CredentialCodec::with_ttl(
        &config.jwt_secret,
        chrono::Duration::hours(config.token_ttl_hours),
    );

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let follow_repo = Arc::new(PostgresFollowRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let comment_repo = Arc::new(PostgresCommentRepository::new(pool.clone()));

    let auth_service = AuthService::new(user_repo.clone(), codec.clone());
    let user_service = UserService::new(user_repo, follow_repo);
    let post_service = PostService::new(post_repo);
    let comment_service = CommentService::new(comment_repo);

    let bind_address = (config.host.clone(), config.port);
    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    let config_data = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(build_cors(&config_data))
            .app_data(web::Data::new(codec.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(post_service.clone()))
            .app_data(web::Data::new(comment_service.clone()))
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Credentials are allowed, so origins are listed explicitly and request
/// headers are reflected back on preflight.
fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
