use crate::result::AppState;
use actix_web::{HttpResponse, Responder, get, web};
use common::errors::AppError;
use common::util::date_util::now_iso;
use serde::Serialize;
use utoipa::ToSchema;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(maintenance);
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    /// 进程启动以来的秒数
    pub uptime: f64,
    pub environment: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "服务状态",
    responses(
        (status = 200, description = "服务正常", body = HealthStatus)
    )
)]
#[get("/api/health")]
pub async fn health(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    Ok(web::Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: now_iso(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.get_sys().environment,
    }))
}

#[utoipa::path(
    get,
    path = "/api/health/maintenance",
    tag = "Health",
    summary = "维护模式",
    responses(
        (status = 503, description = "服务维护中")
    )
)]
#[get("/api/health/maintenance")]
pub async fn maintenance() -> impl Responder {
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "status": "maintenance",
        "message": "Service is under maintenance",
        "timestamp": now_iso(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use actix_web::App;
    use common::config::AppConfig;
    use std::sync::Arc;

    #[actix_web::test]
    async fn health_reports_environment() {
        let state = AppState::new(Arc::new(AppConfig::default()));
        let app = init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;
        let resp = call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "development");
        assert!(body["uptime"].as_f64().is_some());
    }

    #[actix_web::test]
    async fn maintenance_is_unavailable() {
        let app = init_service(App::new().configure(configure)).await;
        let resp = call_service(&app, TestRequest::get().uri("/api/health/maintenance").to_request()).await;
        assert_eq!(resp.status(), 503);
    }
}
