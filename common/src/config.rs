use anyhow::{Context, Result};
use config::Config;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub server: Option<ServerConfig>,
    pub sys: Option<SysConfig>,
    pub auth: Option<AuthConfig>,
}

impl AppConfig {
    /// 读取配置文件，并允许 `APP_` 前缀的环境变量覆盖（如 `APP_DATABASE__URL`）
    pub fn new(file: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(config::File::with_name(file).required(true))
            .add_source(config::Environment::with_prefix("APP").prefix_separator("_").separator("__"))
            .build()
            .with_context(|| format!("Failed to build configuration from {}", file))?;
        config.try_deserialize::<AppConfig>().context("Failed to deserialize configuration")
    }

    pub fn init(file: &str) -> Result<()> {
        let instance = Self::new(file)?;
        INSTANCE.set(Arc::new(instance)).map_err(|_| anyhow::anyhow!("AppConfig already initialized"))
    }

    pub fn get_database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }
    pub fn get_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
    pub fn get_sys(&self) -> SysConfig {
        self.sys.clone().unwrap_or_default()
    }
    pub fn get_auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }

    /// 获取单例
    pub fn get() -> Arc<Self> {
        INSTANCE.get().expect("AppConfig is not initialized").clone()
    }
}
static INSTANCE: OnceCell<Arc<AppConfig>> = OnceCell::new();

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub db_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "mongodb://localhost:27017".to_string(), db_name: "brokerage".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SysConfig {
    //全局日志级别
    pub log_level: String,
    // development / production，health 接口原样返回
    pub environment: String,
}

impl Default for SysConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), environment: "development".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 5001 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 签名密钥
    pub jwt_secret: String,
    /// token 有效期（秒）
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_secs: 7 * 24 * 3600 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get_server().port, 5001);
        assert_eq!(cfg.get_sys().log_level, "info");
        assert_eq!(cfg.get_auth().token_ttl_secs, 604800);
        assert_eq!(cfg.get_database().db_name, "brokerage");
    }

    #[test]
    fn partial_section_keeps_field_defaults() {
        let cfg: AppConfig = Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let server = cfg.get_server();
        assert_eq!(server.port, 8080);
        assert_eq!(server.host, "127.0.0.1");
    }
}
