use crate::handlers::check_id;
use crate::handlers::client::client_handler_dto::{CheckDuplicatesDto, ClientListQuery, CreateClientDto, UpdateClientDto};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::client_service::{ClientService, ClientStats, DuplicateCheck, search_filter};
use biz_service::entitys::client_entity::ClientView;
use common::errors::AppError;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // 静态子路径必须先于 /{id} 注册
    cfg.service(client_stats)
        .service(check_duplicates)
        .service(list_clients)
        .service(create_client)
        .service(get_client)
        .service(update_client)
        .service(delete_client);
}

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    summary = "客户列表",
    params(ClientListQuery),
    responses(
        (status = 200, description = "`{ clients, pagination }`", body = Vec<ClientView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/clients")]
pub async fn list_clients(query: web::Query<ClientListQuery>) -> Result<impl Responder, AppError> {
    let page = query.page()?;
    let mut filter = query.to_query_doc();
    if let Some(search) = &query.search {
        filter.extend(search_filter(search));
    }
    let result = ClientService::get().list(filter, &page).await?;
    Ok(web::Json(result_page("clients", result)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    summary = "客户详情",
    params(("id" = String, Path, description = "客户 id")),
    responses(
        (status = 200, description = "`{ client }`", body = ClientView),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/clients/{id}")]
pub async fn get_client(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Client")?;
    let view = ClientService::get().view(&id).await?;
    Ok(web::Json(result_data("client", view)))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    summary = "新建客户",
    request_body = CreateClientDto,
    responses(
        (status = 201, description = "`{ message, client }`", body = ClientView),
        (status = 400, description = "参数错误或邮箱 / 电话重复")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/clients")]
pub async fn create_client(user: CurrentUser, dto: web::Json<CreateClientDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = ClientService::get();
    let client = svc.create(dto.into_entity(user.id())).await?;
    let view = svc.to_view(client).await?;
    Ok(created(result_msg_data("Client created successfully", "client", view)))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    summary = "更新客户",
    params(("id" = String, Path, description = "客户 id")),
    request_body = UpdateClientDto,
    responses(
        (status = 200, description = "`{ message, client }`", body = ClientView),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/clients/{id}")]
pub async fn update_client(id: web::Path<String>, dto: web::Json<UpdateClientDto>) -> Result<impl Responder, AppError> {
    check_id(&id, "Client")?;
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = ClientService::get();
    let mut client = svc.find(&id).await?;
    dto.apply(&mut client);
    let client = svc.update(client).await?;
    let view = svc.to_view(client).await?;
    Ok(web::Json(result_msg_data("Client updated successfully", "client", view)))
}

#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    summary = "删除客户及其角色",
    params(("id" = String, Path, description = "客户 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Client not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/clients/{id}")]
pub async fn delete_client(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Client")?;
    ClientService::get().delete(&id).await?;
    Ok(web::Json(result_msg("Client deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/clients/stats/overview",
    tag = "Clients",
    summary = "客户统计",
    responses(
        (status = 200, description = "总数、按类型 / 来源 / 角色分组", body = ClientStats)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/clients/stats/overview")]
pub async fn client_stats() -> Result<impl Responder, AppError> {
    Ok(web::Json(ClientService::get().stats().await?))
}

#[utoipa::path(
    post,
    path = "/api/clients/check-duplicates",
    tag = "Clients",
    summary = "检查邮箱 / 电话是否已被占用",
    request_body = CheckDuplicatesDto,
    responses(
        (status = 200, description = "`{ emailExists, phoneExists }`", body = DuplicateCheck)
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/clients/check-duplicates")]
pub async fn check_duplicates(dto: web::Json<CheckDuplicatesDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let check = ClientService::get()
        .check_duplicates(dto.email.as_deref(), dto.phone.as_deref(), dto.exclude_id.as_deref())
        .await?;
    Ok(web::Json(check))
}
