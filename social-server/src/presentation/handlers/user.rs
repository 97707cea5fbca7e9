use actix_web::{HttpRequest, HttpResponse, delete, get, put, web};
use tracing::info;

use crate::application::user_service::UserService;
use crate::domain::error::DomainError;
use crate::domain::user::{UserId, UserInput};
use crate::presentation::dto::{MessageResponse, SearchQuery, UserResponse};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::presentation::utils::{AuthenticatedUser, ensure_owner, request_id};

#[get("/users", wrap = "JwtAuthMiddleware")]
pub async fn search_users(
    service: web::Data<UserService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, DomainError> {
    let users = service.search(&query.user).await?;
    if users.is_empty() {
        return Ok(HttpResponse::NotFound().json(MessageResponse::new("no users found")));
    }

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[get("/users/{id}", wrap = "JwtAuthMiddleware")]
pub async fn get_user(
    service: web::Data<UserService>,
    path: web::Path<UserId>,
) -> Result<HttpResponse, DomainError> {
    let user = service.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[put("/users/{id}", wrap = "JwtAuthMiddleware")]
pub async fn update_user(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<UserId>,
    body: web::Bytes,
) -> Result<HttpResponse, DomainError> {
    let target = path.into_inner();
    ensure_owner(target, user.id, "you can only update your own profile")?;

    let input: UserInput = serde_json::from_slice(&body)
        .map_err(|e| DomainError::bad_input(format!("invalid request body: {e}")))?;
    let updated = service.update_user(target, input).await?;

    info!(request_id = %request_id(&req), user_id = target, "user updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

#[delete("/users/{id}", wrap = "JwtAuthMiddleware")]
pub async fn delete_user(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<UserService>,
    path: web::Path<UserId>,
) -> Result<HttpResponse, DomainError> {
    let target = path.into_inner();
    ensure_owner(target, user.id, "you can only delete your own account")?;

    service.delete_user(target).await?;

    info!(request_id = %request_id(&req), user_id = target, "user deleted");

    Ok(HttpResponse::NoContent().finish())
}
