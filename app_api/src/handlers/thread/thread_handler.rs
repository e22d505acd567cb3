use crate::handlers::check_id;
use crate::handlers::thread::thread_handler_dto::{CreateThreadDto, PostMessageDto, ThreadPageQuery};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::thread_service::ThreadService;
use biz_service::entitys::thread_entity::{MessageView, ThreadView};
use common::errors::AppError;
use serde_json::json;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_threads)
        .service(create_thread)
        .service(list_messages)
        .service(post_message)
        .service(mark_read)
        .service(get_thread)
        .service(delete_thread);
}

#[utoipa::path(
    get,
    path = "/api/threads",
    tag = "Threads",
    summary = "当前用户参与的会话",
    params(ThreadPageQuery),
    responses(
        (status = 200, description = "`{ threads, pagination }`", body = Vec<ThreadView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/threads")]
pub async fn list_threads(user: CurrentUser, query: web::Query<ThreadPageQuery>) -> Result<impl Responder, AppError> {
    let page = query.thread_page()?;
    let result = ThreadService::get().list_for(user.id(), &page).await?;
    Ok(web::Json(result_page("threads", result)))
}

#[utoipa::path(
    get,
    path = "/api/threads/{id}",
    tag = "Threads",
    summary = "会话详情",
    params(("id" = String, Path, description = "会话 id")),
    responses(
        (status = 200, description = "`{ thread }`", body = ThreadView),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/threads/{id}")]
pub async fn get_thread(user: CurrentUser, id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Thread")?;
    let view = ThreadService::get().view_for(&id, user.id()).await?;
    Ok(web::Json(result_data("thread", view)))
}

#[utoipa::path(
    post,
    path = "/api/threads",
    tag = "Threads",
    summary = "新建会话（创建者自动加入）",
    request_body = CreateThreadDto,
    responses(
        (status = 201, description = "`{ message, thread }`", body = ThreadView),
        (status = 400, description = "参与者不存在")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/threads")]
pub async fn create_thread(user: CurrentUser, dto: web::Json<CreateThreadDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = ThreadService::get();
    let thread = svc.create(dto.into_entity(), user.id()).await?;
    let view = svc.to_views(vec![thread]).await?.pop().ok_or_else(|| AppError::not_found("Thread"))?;
    Ok(created(result_msg_data("Thread created successfully", "thread", view)))
}

#[utoipa::path(
    delete,
    path = "/api/threads/{id}",
    tag = "Threads",
    summary = "删除会话（软删除）",
    params(("id" = String, Path, description = "会话 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/threads/{id}")]
pub async fn delete_thread(user: CurrentUser, id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Thread")?;
    ThreadService::get().soft_delete(&id, user.id()).await?;
    Ok(web::Json(result_msg("Thread deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/threads/{id}/messages",
    tag = "Threads",
    summary = "会话消息（默认时间正序）",
    params(("id" = String, Path, description = "会话 id"), ThreadPageQuery),
    responses(
        (status = 200, description = "`{ messages, pagination }`", body = Vec<MessageView>),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/threads/{id}/messages")]
pub async fn list_messages(
    user: CurrentUser,
    id: web::Path<String>,
    query: web::Query<ThreadPageQuery>,
) -> Result<impl Responder, AppError> {
    check_id(&id, "Thread")?;
    let page = query.message_page()?;
    let result = ThreadService::get().messages(&id, user.id(), &page).await?;
    Ok(web::Json(result_page("messages", result)))
}

#[utoipa::path(
    post,
    path = "/api/threads/{id}/messages",
    tag = "Threads",
    summary = "发送消息",
    params(("id" = String, Path, description = "会话 id")),
    request_body = PostMessageDto,
    responses(
        (status = 201, description = "`{ message, data }`", body = MessageView),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/threads/{id}/messages")]
pub async fn post_message(
    user: CurrentUser,
    id: web::Path<String>,
    dto: web::Json<PostMessageDto>,
) -> Result<impl Responder, AppError> {
    check_id(&id, "Thread")?;
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let view = ThreadService::get().post_message(dto.into_entity(&id, user.id())).await?;
    Ok(created(result_msg_data("Message sent successfully", "data", view)))
}

#[utoipa::path(
    put,
    path = "/api/threads/{id}/messages/read",
    tag = "Threads",
    summary = "把他人发送的消息标记为已读",
    params(("id" = String, Path, description = "会话 id")),
    responses(
        (status = 200, description = "`{ message, modifiedCount }`"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/threads/{id}/messages/read")]
pub async fn mark_read(user: CurrentUser, id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Thread")?;
    let modified = ThreadService::get().mark_read(&id, user.id()).await?;
    Ok(web::Json(json!({ "message": "Messages marked as read", "modifiedCount": modified })))
}
