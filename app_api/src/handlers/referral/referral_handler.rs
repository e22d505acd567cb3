use crate::handlers::referral::referral_handler_dto::{CreateReferralDto, ReferralListQuery, UpdateReferralDto};
use crate::handlers::{check_id, merge_id_filter};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::client_service::ClientService;
use biz_service::biz_service::referral_service::{ReferralService, ReferralStats};
use biz_service::entitys::referral_entity::ReferralView;
use common::errors::AppError;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(referral_stats)
        .service(list_for_client)
        .service(list_referrals)
        .service(create_referral)
        .service(get_referral)
        .service(update_referral)
        .service(delete_referral);
}

#[utoipa::path(
    get,
    path = "/api/referrals",
    tag = "Referrals",
    summary = "推荐列表",
    params(ReferralListQuery),
    responses(
        (status = 200, description = "`{ referrals, pagination }`", body = Vec<ReferralView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/referrals")]
pub async fn list_referrals(query: web::Query<ReferralListQuery>) -> Result<impl Responder, AppError> {
    let page = query.page()?;
    let mut filter = query.to_query_doc();
    if let Some(search) = &query.search {
        let ids = ClientService::get().search_ids(search).await?;
        merge_id_filter(&mut filter, "referredByClientId", ids);
    }
    let result = ReferralService::get().list(filter, &page).await?;
    Ok(web::Json(result_page("referrals", result)))
}

#[utoipa::path(
    get,
    path = "/api/referrals/{id}",
    tag = "Referrals",
    summary = "推荐详情",
    params(("id" = String, Path, description = "推荐 id")),
    responses(
        (status = 200, description = "`{ referral }`", body = ReferralView),
        (status = 404, description = "Referral not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/referrals/{id}")]
pub async fn get_referral(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Referral")?;
    let view = ReferralService::get().view(&id).await?;
    Ok(web::Json(result_data("referral", view)))
}

#[utoipa::path(
    post,
    path = "/api/referrals",
    tag = "Referrals",
    summary = "新建推荐",
    request_body = CreateReferralDto,
    responses(
        (status = 201, description = "`{ message, referral }`", body = ReferralView),
        (status = 400, description = "参数错误或推荐对象与类型不符"),
        (status = 404, description = "推荐人、被推荐对象或上级推荐不存在")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/referrals")]
pub async fn create_referral(user: CurrentUser, dto: web::Json<CreateReferralDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = ReferralService::get();
    let referral = svc.create(dto.into_entity(user.id())).await?;
    let view = svc.to_view(referral).await?;
    Ok(created(result_msg_data("Referral created successfully", "referral", view)))
}

#[utoipa::path(
    put,
    path = "/api/referrals/{id}",
    tag = "Referrals",
    summary = "更新推荐",
    params(("id" = String, Path, description = "推荐 id")),
    request_body = UpdateReferralDto,
    responses(
        (status = 200, description = "`{ message, referral }`", body = ReferralView),
        (status = 404, description = "Referral not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/referrals/{id}")]
pub async fn update_referral(id: web::Path<String>, dto: web::Json<UpdateReferralDto>) -> Result<impl Responder, AppError> {
    check_id(&id, "Referral")?;
    dto.validate()?;
    let svc = ReferralService::get();
    let previous = svc.find(&id).await?;
    let mut referral = previous.clone();
    dto.into_inner().apply(&mut referral);
    let referral = svc.update(&previous, referral).await?;
    let view = svc.to_view(referral).await?;
    Ok(web::Json(result_msg_data("Referral updated successfully", "referral", view)))
}

#[utoipa::path(
    delete,
    path = "/api/referrals/{id}",
    tag = "Referrals",
    summary = "删除推荐",
    params(("id" = String, Path, description = "推荐 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Referral not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/referrals/{id}")]
pub async fn delete_referral(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Referral")?;
    ReferralService::get().delete(&id).await?;
    Ok(web::Json(result_msg("Referral deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/referrals/client/{clientId}",
    tag = "Referrals",
    summary = "客户作为推荐人或被推荐人的全部推荐",
    params(("clientId" = String, Path, description = "客户 id")),
    responses(
        (status = 200, description = "`{ referrals }`", body = Vec<ReferralView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/referrals/client/{client_id}")]
pub async fn list_for_client(client_id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&client_id, "Client")?;
    let referrals = ReferralService::get().list_for_client(&client_id).await?;
    Ok(web::Json(result_data("referrals", referrals)))
}

#[utoipa::path(
    get,
    path = "/api/referrals/stats/overview",
    tag = "Referrals",
    summary = "推荐统计",
    responses(
        (status = 200, description = "总数、佣金汇总及分组", body = ReferralStats)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/referrals/stats/overview")]
pub async fn referral_stats() -> Result<impl Responder, AppError> {
    Ok(web::Json(ReferralService::get().stats().await?))
}
