use crate::handlers::check_id;
use crate::handlers::lookout::lookout_handler_dto::{CreateLookoutDto, LookoutListQuery, UpdateLookoutDto, search_clause};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::client_service::ClientService;
use biz_service::biz_service::lookout_service::{LookoutService, LookoutStats};
use biz_service::entitys::lookout_entity::LookoutView;
use common::errors::AppError;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(lookout_stats)
        .service(list_for_client)
        .service(list_lookouts)
        .service(create_lookout)
        .service(get_lookout)
        .service(update_lookout)
        .service(delete_lookout);
}

#[utoipa::path(
    get,
    path = "/api/lookouts",
    tag = "Lookouts",
    summary = "求购需求列表",
    params(LookoutListQuery),
    responses(
        (status = 200, description = "`{ lookouts, pagination }`", body = Vec<LookoutView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/lookouts")]
pub async fn list_lookouts(query: web::Query<LookoutListQuery>) -> Result<impl Responder, AppError> {
    let page = query.page()?;
    let mut filter = query.to_query_doc();
    if let Some(search) = &query.search {
        let ids = ClientService::get().search_ids(search).await?;
        filter.extend(search_clause(search, ids));
    }
    let result = LookoutService::get().list(filter, &page).await?;
    Ok(web::Json(result_page("lookouts", result)))
}

#[utoipa::path(
    get,
    path = "/api/lookouts/{id}",
    tag = "Lookouts",
    summary = "求购需求详情",
    params(("id" = String, Path, description = "需求 id")),
    responses(
        (status = 200, description = "`{ lookout }`", body = LookoutView),
        (status = 404, description = "Lookout not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/lookouts/{id}")]
pub async fn get_lookout(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Lookout")?;
    let view = LookoutService::get().view(&id).await?;
    Ok(web::Json(result_data("lookout", view)))
}

#[utoipa::path(
    post,
    path = "/api/lookouts",
    tag = "Lookouts",
    summary = "新建求购需求",
    request_body = CreateLookoutDto,
    responses(
        (status = 201, description = "`{ message, lookout }`", body = LookoutView),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/lookouts")]
pub async fn create_lookout(user: CurrentUser, dto: web::Json<CreateLookoutDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = LookoutService::get();
    let lookout = svc.create(dto.into_entity(user.id())).await?;
    let view = svc.to_view(lookout).await?;
    Ok(created(result_msg_data("Lookout created successfully", "lookout", view)))
}

#[utoipa::path(
    put,
    path = "/api/lookouts/{id}",
    tag = "Lookouts",
    summary = "更新求购需求",
    params(("id" = String, Path, description = "需求 id")),
    request_body = UpdateLookoutDto,
    responses(
        (status = 200, description = "`{ message, lookout }`", body = LookoutView),
        (status = 404, description = "Lookout not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/lookouts/{id}")]
pub async fn update_lookout(id: web::Path<String>, dto: web::Json<UpdateLookoutDto>) -> Result<impl Responder, AppError> {
    check_id(&id, "Lookout")?;
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = LookoutService::get();
    let mut lookout = svc.find(&id).await?;
    dto.apply(&mut lookout);
    let lookout = svc.update(lookout).await?;
    let view = svc.to_view(lookout).await?;
    Ok(web::Json(result_msg_data("Lookout updated successfully", "lookout", view)))
}

#[utoipa::path(
    delete,
    path = "/api/lookouts/{id}",
    tag = "Lookouts",
    summary = "删除求购需求",
    params(("id" = String, Path, description = "需求 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Lookout not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/lookouts/{id}")]
pub async fn delete_lookout(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Lookout")?;
    LookoutService::get().delete(&id).await?;
    Ok(web::Json(result_msg("Lookout deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/lookouts/client/{clientId}",
    tag = "Lookouts",
    summary = "某客户的全部求购需求",
    params(("clientId" = String, Path, description = "客户 id")),
    responses(
        (status = 200, description = "`{ lookouts }`", body = Vec<LookoutView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/lookouts/client/{client_id}")]
pub async fn list_for_client(client_id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&client_id, "Client")?;
    let lookouts = LookoutService::get().list_for_client(&client_id).await?;
    Ok(web::Json(result_data("lookouts", lookouts)))
}

#[utoipa::path(
    get,
    path = "/api/lookouts/stats/overview",
    tag = "Lookouts",
    summary = "求购需求统计",
    responses(
        (status = 200, description = "总数及按优先级 / 状态分组", body = LookoutStats)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/lookouts/stats/overview")]
pub async fn lookout_stats() -> Result<impl Responder, AppError> {
    Ok(web::Json(LookoutService::get().stats().await?))
}
