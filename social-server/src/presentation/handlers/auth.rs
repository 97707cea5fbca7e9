use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::domain::user::{UserId, UserInput};
use crate::presentation::dto::{
    LoginRequest, MessageResponse, PasswordUpdateRequest, TokenResponse, UserResponse,
};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::presentation::utils::{AuthenticatedUser, ensure_owner, request_id};

#[post("/users")]
pub async fn create_user(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<UserInput>,
) -> Result<HttpResponse, DomainError> {
    let user = service.register(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        nick = %user.nick,
        "user registered"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let user_id = service
        .authenticate(&payload.email, &payload.password)
        .await?;

    info!(user_id, "user logged in");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("logged in successfully"))
}

#[post("/token")]
pub async fn token(
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let access_token = service
        .issue_token(&payload.email, &payload.password)
        .await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        expires_in: service.codec().ttl_seconds(),
        token_type: "Bearer".to_string(),
    }))
}

/// The body is decoded only after the ownership check, so a stranger gets
/// 403 whatever they send.
#[post("/user/{id}/password-update", wrap = "JwtAuthMiddleware")]
pub async fn update_password(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<AuthService>,
    path: web::Path<UserId>,
    body: web::Bytes,
) -> Result<HttpResponse, DomainError> {
    let target = path.into_inner();
    ensure_owner(target, user.id, "you can only change your own password")?;

    let payload: PasswordUpdateRequest = serde_json::from_slice(&body)
        .map_err(|e| DomainError::bad_input(format!("invalid request body: {e}")))?;
    service
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;

    info!(request_id = %request_id(&req), user_id = user.id, "password updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("password updated successfully")))
}
