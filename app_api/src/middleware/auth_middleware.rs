use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
};
use biz_service::biz_service::user_service::UserService;
use biz_service::entitys::user_entity::UserEntity;
use biz_service::manager::token_manager::TokenManager;
use common::errors::AppError;
use futures_util::future::{LocalBoxFuture, Ready, err, ok};
use std::rc::Rc;
use std::task::{Context, Poll};

/// 不需要登录的路径
const PUBLIC_PATHS: [&str; 4] = ["/api/health", "/api/auth/login", "/api/auth/register", "/openapi.json"];
const PUBLIC_PREFIXES: [&str; 1] = ["/api/health/"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// 从 `Authorization: Bearer <token>` 中取 token
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// 当前登录用户，由中间件写入请求扩展
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserEntity);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>() {
            Some(user) => ok(user.clone()),
            None => err(AppError::Unauthorized("No token, authorization denied".into())),
        }
    }
}

/// Authentication Middleware
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService { service: Rc::new(service) })
    }
}

/// Middleware Service Struct
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        Box::pin(async move {
            if is_public(req.path()) {
                let res = srv.call(req).await?;
                return Ok(res.map_into_left_body());
            }
            let header = req.headers().get("Authorization").and_then(|v| v.to_str().ok());
            let user = match bearer_token(header) {
                Some(token) => authenticate(token).await,
                None => Err(AppError::Unauthorized("No token, authorization denied".into())),
            };
            match user {
                Ok(user) => {
                    req.extensions_mut().insert(CurrentUser(user));
                    let res = srv.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(e) => Ok(req.into_response(e.error_response().map_into_right_body())),
            }
        })
    }
}

async fn authenticate(token: &str) -> Result<UserEntity, AppError> {
    let claims = TokenManager::get().verify(token)?;
    UserService::get().find_active(&claims.sub).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use actix_web::{App, HttpResponse, web};
    use common::config::AuthConfig;

    fn init_tokens() {
        let _ = TokenManager::init(&AuthConfig { jwt_secret: "middleware-test-secret".into(), token_ttl_secs: 60 });
    }

    #[test]
    fn public_path_rules() {
        assert!(is_public("/api/health"));
        assert!(is_public("/api/health/maintenance"));
        assert!(is_public("/api/auth/login"));
        assert!(!is_public("/api/auth/me"));
        assert!(!is_public("/api/clients"));
        assert!(!is_public("/api/healthcheck-admin"));
        assert!(!is_public("/api/healthz"));
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[actix_web::test]
    async fn missing_token_is_rejected() {
        let app = init_service(
            App::new().wrap(AuthMiddleware).route("/api/clients", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let resp = call_service(&app, TestRequest::get().uri("/api/clients").to_request()).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["message"], "No token, authorization denied");
    }

    #[actix_web::test]
    async fn invalid_token_is_rejected() {
        init_tokens();
        let app = init_service(
            App::new().wrap(AuthMiddleware).route("/api/clients", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let req = TestRequest::get().uri("/api/clients").insert_header(("Authorization", "Bearer not-a-jwt")).to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn public_routes_skip_auth() {
        let app = init_service(
            App::new().wrap(AuthMiddleware).route("/api/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let resp = call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;
        assert_eq!(resp.status(), 200);
    }
}
