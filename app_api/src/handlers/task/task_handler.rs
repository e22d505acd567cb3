use crate::handlers::check_id;
use crate::handlers::task::task_handler_dto::{CreateTaskDto, TaskListQuery, UpdateTaskDto};
use crate::middleware::auth_middleware::CurrentUser;
use crate::result::{created, result_data, result_msg, result_msg_data, result_page};
use actix_web::{Responder, delete, get, post, put, web};
use biz_service::biz_service::task_service::TaskService;
use biz_service::entitys::task_entity::TaskView;
use common::errors::AppError;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tasks).service(create_task).service(get_task).service(update_task).service(delete_task);
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    summary = "任务列表",
    params(TaskListQuery),
    responses(
        (status = 200, description = "`{ tasks, pagination }`", body = Vec<TaskView>)
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/tasks")]
pub async fn list_tasks(query: web::Query<TaskListQuery>) -> Result<impl Responder, AppError> {
    let page = query.page()?;
    let result = TaskService::get().list(query.filter(), &page).await?;
    Ok(web::Json(result_page("tasks", result)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    summary = "任务详情",
    params(("id" = String, Path, description = "任务 id")),
    responses(
        (status = 200, description = "`{ task }`", body = TaskView),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/api/tasks/{id}")]
pub async fn get_task(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Task")?;
    let view = TaskService::get().view(&id).await?;
    Ok(web::Json(result_data("task", view)))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    summary = "新建任务",
    request_body = CreateTaskDto,
    responses(
        (status = 201, description = "`{ message, task }`", body = TaskView),
        (status = 404, description = "关联客户或物业不存在")
    ),
    security(("bearer_auth" = []))
)]
#[post("/api/tasks")]
pub async fn create_task(user: CurrentUser, dto: web::Json<CreateTaskDto>) -> Result<impl Responder, AppError> {
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = TaskService::get();
    let task = svc.create(dto.into_entity(user.id())).await?;
    let view = svc.to_view(task).await?;
    Ok(created(result_msg_data("Task created successfully", "task", view)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    summary = "更新任务",
    params(("id" = String, Path, description = "任务 id")),
    request_body = UpdateTaskDto,
    responses(
        (status = 200, description = "`{ message, task }`", body = TaskView),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/api/tasks/{id}")]
pub async fn update_task(id: web::Path<String>, dto: web::Json<UpdateTaskDto>) -> Result<impl Responder, AppError> {
    check_id(&id, "Task")?;
    let mut dto = dto.into_inner();
    dto.normalize();
    dto.validate()?;
    let svc = TaskService::get();
    let mut task = svc.find(&id).await?;
    let previous = task.status;
    dto.apply(&mut task);
    let task = svc.update(previous, task).await?;
    let view = svc.to_view(task).await?;
    Ok(web::Json(result_msg_data("Task updated successfully", "task", view)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    summary = "删除任务（软删除）",
    params(("id" = String, Path, description = "任务 id")),
    responses(
        (status = 200, description = "`{ message }`"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/api/tasks/{id}")]
pub async fn delete_task(id: web::Path<String>) -> Result<impl Responder, AppError> {
    check_id(&id, "Task")?;
    TaskService::get().soft_delete(&id).await?;
    Ok(web::Json(result_msg("Task deleted successfully")))
}
