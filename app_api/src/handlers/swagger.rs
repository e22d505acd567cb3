use crate::handlers::auth::auth_handler_dto::{AuthResponse, LoginDto, RegisterDto};
use crate::handlers::client::client_handler_dto::{CheckDuplicatesDto, CreateClientDto, UpdateClientDto};
use crate::handlers::client_role::client_role_handler_dto::{CreateClientRoleDto, UpdateClientRoleDto};
use crate::handlers::common_handler::HealthStatus;
use crate::handlers::lookout::lookout_handler_dto::{CreateLookoutDto, UpdateLookoutDto};
use crate::handlers::property::property_handler_dto::{CreatePropertyDto, PartyDto, UpdatePropertyDto};
use crate::handlers::referral::referral_handler_dto::{CreateReferralDto, UpdateReferralDto};
use crate::handlers::task::task_handler_dto::{CreateTaskDto, UpdateTaskDto};
use crate::handlers::thread::thread_handler_dto::{CreateThreadDto, PostMessageDto};
use actix_web::{HttpResponse, Responder, get, web};
use common::errors::AppError;
use common::repository_util::Pagination;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "Brokerage back office API"),
    paths(
        // 健康检查
        crate::handlers::common_handler::health,
        crate::handlers::common_handler::maintenance,

        // 认证
        crate::handlers::auth::register_handler::register,
        crate::handlers::auth::login_handler::login,
        crate::handlers::auth::me_handler::me,

        // 客户
        crate::handlers::client::client_handler::list_clients,
        crate::handlers::client::client_handler::get_client,
        crate::handlers::client::client_handler::create_client,
        crate::handlers::client::client_handler::update_client,
        crate::handlers::client::client_handler::delete_client,
        crate::handlers::client::client_handler::client_stats,
        crate::handlers::client::client_handler::check_duplicates,

        // 物业
        crate::handlers::property::property_handler::list_properties,
        crate::handlers::property::property_handler::get_property,
        crate::handlers::property::property_handler::create_property,
        crate::handlers::property::property_handler::update_property,
        crate::handlers::property::property_handler::delete_property,

        // 客户角色
        crate::handlers::client_role::client_role_handler::list_client_roles,
        crate::handlers::client_role::client_role_handler::get_client_role,
        crate::handlers::client_role::client_role_handler::create_client_role,
        crate::handlers::client_role::client_role_handler::update_client_role,
        crate::handlers::client_role::client_role_handler::delete_client_role,
        crate::handlers::client_role::client_role_handler::list_for_client,
        crate::handlers::client_role::client_role_handler::list_for_property,

        // 推荐
        crate::handlers::referral::referral_handler::list_referrals,
        crate::handlers::referral::referral_handler::get_referral,
        crate::handlers::referral::referral_handler::create_referral,
        crate::handlers::referral::referral_handler::update_referral,
        crate::handlers::referral::referral_handler::delete_referral,
        crate::handlers::referral::referral_handler::list_for_client,
        crate::handlers::referral::referral_handler::referral_stats,

        // 求购需求
        crate::handlers::lookout::lookout_handler::list_lookouts,
        crate::handlers::lookout::lookout_handler::get_lookout,
        crate::handlers::lookout::lookout_handler::create_lookout,
        crate::handlers::lookout::lookout_handler::update_lookout,
        crate::handlers::lookout::lookout_handler::delete_lookout,
        crate::handlers::lookout::lookout_handler::list_for_client,
        crate::handlers::lookout::lookout_handler::lookout_stats,

        // 任务
        crate::handlers::task::task_handler::list_tasks,
        crate::handlers::task::task_handler::get_task,
        crate::handlers::task::task_handler::create_task,
        crate::handlers::task::task_handler::update_task,
        crate::handlers::task::task_handler::delete_task,

        // 会话
        crate::handlers::thread::thread_handler::list_threads,
        crate::handlers::thread::thread_handler::get_thread,
        crate::handlers::thread::thread_handler::create_thread,
        crate::handlers::thread::thread_handler::delete_thread,
        crate::handlers::thread::thread_handler::list_messages,
        crate::handlers::thread::thread_handler::post_message,
        crate::handlers::thread::thread_handler::mark_read,
    ),
    components(schemas(
        Pagination,
        HealthStatus,
        RegisterDto,
        LoginDto,
        AuthResponse,
        CreateClientDto,
        UpdateClientDto,
        CheckDuplicatesDto,
        CreatePropertyDto,
        UpdatePropertyDto,
        PartyDto,
        CreateClientRoleDto,
        UpdateClientRoleDto,
        CreateReferralDto,
        UpdateReferralDto,
        CreateLookoutDto,
        UpdateLookoutDto,
        CreateTaskDto,
        UpdateTaskDto,
        CreateThreadDto,
        PostMessageDto,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "服务状态"),
        (name = "Auth", description = "注册、登录与当前用户"),
        (name = "Clients", description = "客户"),
        (name = "Properties", description = "物业"),
        (name = "ClientRoles", description = "客户在物业上的角色"),
        (name = "Referrals", description = "推荐与佣金"),
        (name = "Lookouts", description = "求购需求"),
        (name = "Tasks", description = "任务"),
        (name = "Threads", description = "会话与消息"),
    )
)]
pub struct ApiDoc;

/// 注册 `bearer_auth` 安全方案，handler 上的 `security(("bearer_auth" = []))` 引用它
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(openapi_json);
}

#[get("/openapi.json")]
async fn openapi_json() -> Result<impl Responder, AppError> {
    let json = ApiDoc::openapi().to_json().map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().content_type("application/json").body(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service, read_body};
    use actix_web::App;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in ["/api/clients", "/api/properties/{id}", "/api/client-roles", "/api/referrals/stats/overview", "/api/lookouts", "/api/tasks", "/api/threads/{id}/messages/read", "/api/auth/login"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[actix_web::test]
    async fn openapi_json_is_served() {
        let app = init_service(App::new().configure(configure)).await;
        let req = TestRequest::get().uri("/openapi.json").to_request();
        let resp = call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"]["/api/clients"].is_object());
    }
}
