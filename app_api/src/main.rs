use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use app_api::handlers;
use app_api::middleware::auth_middleware::AuthMiddleware;
use app_api::result::{AppState, json_config, path_config, query_config};
use biz_service::manager::token_manager::TokenManager;
use common::config::AppConfig;
use common::repository::db;
use env_logger::Env;
use log::info;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 读取配置文件
    AppConfig::init("api-config.toml")?;
    let app_cfg = AppConfig::get();
    //初始化日志
    env_logger::Builder::from_env(Env::default().default_filter_or(app_cfg.get_sys().log_level)).init();

    let database = db::connect(&app_cfg.get_database()).await?;
    TokenManager::init(&app_cfg.get_auth())?;
    biz_service::init_service(database);
    biz_service::biz_service::init_indexes().await?;

    let state = AppState::new(app_cfg.clone());
    let address_and_port = format!("{}:{}", app_cfg.get_server().host, app_cfg.get_server().port);
    info!("Starting server on {} ({})", address_and_port, app_cfg.get_sys().environment);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .wrap(AuthMiddleware)
            .wrap(Logger::default())
            // 配置 控制器
            .configure(handlers::configure)
    })
    .keep_alive(actix_web::http::KeepAlive::Timeout(Duration::from_secs(75)))
    .bind(address_and_port)?
    .run()
    .await?;
    Ok(())
}
