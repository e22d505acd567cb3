use crate::middleware::auth_middleware::CurrentUser;
use crate::result::result_data;
use actix_web::{Responder, get, web};
use biz_service::entitys::user_entity::UserProfile;
use common::errors::AppError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(me);
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    summary = "当前登录用户",
    responses(
        (status = 200, description = "`{ user }`", body = UserProfile),
        (status = 401, description = "未登录")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/auth/me")]
pub async fn me(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(web::Json(result_data("user", UserProfile::from(&user.0))))
}
