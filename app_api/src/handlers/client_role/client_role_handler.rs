use crate::handlers::client_role::client_role_handler_dto::{ClientRoleListQuery, CreateClientRoleDto, UpdateClientRoleDto};
use crate::handlers::{check_id, merge_id_filter};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::client_role_service::ClientRoleService;
use biz_service::biz_service::client_service::ClientService;
use biz_service::entitys::client_role_entity::ClientRoleView;
use common::errors::AppError;
use mongodb::bson::doc;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_for_client)
        .service(list_for_property)
        .service(list_client_roles)
        .service(create_client_role)
        .service(get_client_role)
        .service(update_client_role)
        .service(delete_client_role);
}

#[utoipa::path(
    get,
    path = "/api/client-roles",
    tag = "Client Roles",
    summary = "客户角色列表",
    params(ClientRoleListQuery),
    responses(
        (status = 200, description = "`{ clientRoles, pagination }`", body = Vec<ClientRoleView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/client-roles")]
pub async fn list_client_roles(query: web::Query<ClientRoleListQuery>) -> Result<impl Responder, AppError> {
    let page = query.page()?;
    let mut filter = query.to_query_doc();
    if let Some(search) = &query.search {
        let ids = ClientService::get().search_ids(search).await?;
        merge_id_filter(&mut filter, "clientId", ids);
    }
    let result = ClientRoleService::get().list(filter, &page).await?;
    Ok(web::Json(result_page("clientRoles", result)))
}

#[utoipa::path(
    get,
    path = "/api/client-roles/{id}",
    tag = "Client Roles",
    summary = "客户角色详情",
    params(("id" = String, Path, description = "角色 id")),
    responses(
        (status = 200, description = "`{ clientRole }`", body = ClientRoleView),
        (status = 404, description = "Client role not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/client-roles/{id}")]
pub async fn get_client_role(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Client role")?;
    let view = ClientRoleService::get().view(&id).await?;
    Ok(web::Json(result_data("clientRole", view)))
}

#[utoipa::path(
    post,
    path = "/api/client-roles",
    tag = "Client Roles",
    summary = "新建客户角色",
    request_body = CreateClientRoleDto,
    responses(
        (status = 201, description = "`{ message, clientRole }`", body = ClientRoleView),
        (status = 400, description = "参数错误或角色重复"),
        (status = 404, description = "客户或物业不存在")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/client-roles")]
pub async fn create_client_role(user: CurrentUser, dto: web::Json<CreateClientRoleDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = ClientRoleService::get();
    let role = svc.create(dto.into_entity(user.id())).await?;
    let view = svc.to_view(role).await?;
    Ok(created(result_msg_data("Client role created successfully", "clientRole", view)))
}

#[utoipa::path(
    put,
    path = "/api/client-roles/{id}",
    tag = "Client Roles",
    summary = "更新客户角色",
    params(("id" = String, Path, description = "角色 id")),
    request_body = UpdateClientRoleDto,
    responses(
        (status = 200, description = "`{ message, clientRole }`", body = ClientRoleView),
        (status = 404, description = "Client role not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/client-roles/{id}")]
pub async fn update_client_role(id: web::Path<String>, dto: web::Json<UpdateClientRoleDto>) -> Result<impl Responder, AppError> {
    check_id(&id, "Client role")?;
    dto.validate()?;
    let svc = ClientRoleService::get();
    let mut role = svc.find(&id).await?;
    dto.into_inner().apply(&mut role);
    let role = svc.update(role).await?;
    let view = svc.to_view(role).await?;
    Ok(web::Json(result_msg_data("Client role updated successfully", "clientRole", view)))
}

#[utoipa::path(
    delete,
    path = "/api/client-roles/{id}",
    tag = "Client Roles",
    summary = "删除客户角色",
    params(("id" = String, Path, description = "角色 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Client role not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/client-roles/{id}")]
pub async fn delete_client_role(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Client role")?;
    ClientRoleService::get().delete(&id).await?;
    Ok(web::Json(result_msg("Client role deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/client-roles/client/{clientId}",
    tag = "Client Roles",
    summary = "某客户的全部角色",
    params(("clientId" = String, Path, description = "客户 id")),
    responses(
        (status = 200, description = "`{ clientRoles }`", body = Vec<ClientRoleView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/client-roles/client/{client_id}")]
pub async fn list_for_client(client_id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&client_id, "Client")?;
    let roles = ClientRoleService::get().list_all(doc! { "clientId": client_id.as_str() }).await?;
    Ok(web::Json(result_data("clientRoles", roles)))
}

#[utoipa::path(
    get,
    path = "/api/client-roles/property/{propertyId}",
    tag = "Client Roles",
    summary = "某物业上的全部角色",
    params(("propertyId" = String, Path, description = "物业 id")),
    responses(
        (status = 200, description = "`{ clientRoles }`", body = Vec<ClientRoleView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/client-roles/property/{property_id}")]
pub async fn list_for_property(property_id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&property_id, "Property")?;
    let roles = ClientRoleService::get().list_all(doc! { "propertyId": property_id.as_str() }).await?;
    Ok(web::Json(result_data("clientRoles", roles)))
}
