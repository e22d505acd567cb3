use crate::handlers::check_id;
use crate::handlers::property::property_handler_dto::{CreatePropertyDto, PropertyListQuery, UpdatePropertyDto};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::property_service::PropertyService;
use biz_service::entitys::property_entity::PropertyView;
use common::errors::AppError;
use common::util::date_util::current_year;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_properties)
        .service(create_property)
        .service(get_property)
        .service(update_property)
        .service(delete_property);
}

#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    summary = "物业列表（仅未删除）",
    params(PropertyListQuery),
    responses(
        (status = 200, description = "`{ properties, pagination }`", body = Vec<PropertyView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/properties")]
pub async fn list_properties(query: web::Query<PropertyListQuery>) -> Result<impl Responder, AppError> {
    let page = query.page()?;
    let result = PropertyService::get().list(query.filter(), &page).await?;
    Ok(web::Json(result_page("properties", result)))
}

#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "Properties",
    summary = "物业详情",
    params(("id" = String, Path, description = "物业 id")),
    responses(
        (status = 200, description = "`{ property }`", body = PropertyView),
        (status = 404, description = "Property not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/properties/{id}")]
pub async fn get_property(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Property")?;
    let view = PropertyService::get().view(&id).await?;
    Ok(web::Json(result_data("property", view)))
}

#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    summary = "新建物业，可同时新建业主 / 推荐人",
    request_body = CreatePropertyDto,
    responses(
        (status = 201, description = "`{ message, property }`", body = PropertyView),
        (status = 400, description = "参数错误"),
        (status = 404, description = "Owner client not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/properties")]
pub async fn create_property(user: CurrentUser, dto: web::Json<CreatePropertyDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let parts = dto.into_parts(user.id(), current_year())?;
    let svc = PropertyService::get();
    let property = svc.create(parts.property, parts.owner, parts.reference).await?;
    let view = svc.to_view(property).await?;
    Ok(created(result_msg_data("Property created successfully", "property", view)))
}

#[utoipa::path(
    put,
    path = "/api/properties/{id}",
    tag = "Properties",
    summary = "更新物业（业主与推荐人不可改）",
    params(("id" = String, Path, description = "物业 id")),
    request_body = UpdatePropertyDto,
    responses(
        (status = 200, description = "`{ message, property }`", body = PropertyView),
        (status = 404, description = "Property not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/properties/{id}")]
pub async fn update_property(id: web::Path<String>, dto: web::Json<UpdatePropertyDto>) -> Result<impl Responder, AppError> {
    check_id(&id, "Property")?;
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = PropertyService::get();
    let mut property = svc.find(&id).await?;
    dto.apply(&mut property, current_year())?;
    let property = svc.update(property).await?;
    let view = svc.to_view(property).await?;
    Ok(web::Json(result_msg_data("Property updated successfully", "property", view)))
}

#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    summary = "删除物业（软删除）",
    params(("id" = String, Path, description = "物业 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Property not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/properties/{id}")]
pub async fn delete_property(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Property")?;
    PropertyService::get().soft_delete(&id).await?;
    Ok(web::Json(result_msg("Property deleted successfully")))
}
