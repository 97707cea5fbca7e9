pub mod auth;
pub mod comment;
pub mod follow;
pub mod post;
pub mod user;


use actix_web::{HttpResponse, Responder, error, get, web};
use chrono::Utc;

use crate::domain::error::DomainError;
use crate::presentation::dto::HealthResponse;

/// Registers every route together with the extractor configs that turn
/// malformed bodies and ids into `400` responses.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        error::Error::from(DomainError::bad_input(format!("invalid request body: {err}")))
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _| {
        error::Error::from(DomainError::bad_input(format!("invalid path parameter: {err}")))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        error::Error::from(DomainError::bad_input(format!("invalid query: {err}")))
    }))
    .service(health)
    .service(auth::create_user)
    .service(auth::login)
    .service(auth::token)
    .service(auth::update_password)
    .service(user::search_users)
    .service(user::get_user)
    .service(user::update_user)
    .service(user::delete_user)
    .service(follow::follow_user)
    .service(follow::unfollow_user)
    .service(follow::followers)
    .service(follow::following)
    .service(post::create_post)
    .service(post::list_posts)
    .service(post::get_post)
    .service(post::update_post)
    .service(post::delete_post)
    .service(post::like_post)
    .service(post::unlike_post)
    .service(comment::add_comment)
    .service(comment::list_comments)
    .service(comment::delete_comment);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
