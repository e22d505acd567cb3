use crate::handlers::auth::auth_handler_dto::{AuthResponse, LoginDto};
use actix_web::{Responder, post, web};
use biz_service::biz_service::user_service::UserService;
use common::errors::AppError;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login);
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "用户登录",
    request_body = LoginDto,
    responses(
        (status = 200, description = "登录成功", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
#[post("/api/auth/login")]
pub async fn login(dto: web::Json<LoginDto>) -> Result<impl Responder, AppError> {
    dto.validate()?;
    let email = dto.email.trim().to_lowercase();
    let (token, user) = UserService::get().login(&email, &dto.password).await?;
    Ok(web::Json(AuthResponse::new(token, &user)))
}
