use crate::handlers::auth::auth_handler_dto::{AuthResponse, RegisterDto};
use crate::result::created;
use actix_web::{Responder, post, web};
use biz_service::biz_service::user_service::UserService;
use common::errors::AppError;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register);
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    summary = "注册用户",
    request_body = RegisterDto,
    responses(
        (status = 201, description = "注册成功", body = AuthResponse),
        (status = 400, description = "参数错误或邮箱已注册")
    )
)]
#[post("/api/auth/register")]
pub async fn register(dto: web::Json<RegisterDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let (token, user) = UserService::get().register(dto.into_entity()).await?;
    Ok(created(serde_json::to_value(AuthResponse::new(token, &user))?))
}
