use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use log::info;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

const APP_NAME: &str = "brokerage-api";

/// 连接 MongoDB 并 ping 一次，返回给各 service 共享的数据库句柄
pub async fn connect(config: &DatabaseConfig) -> Result<Database> {
    let mut options = ClientOptions::parse(&config.url).await.context("MongoDB URI parse error")?;
    options.app_name = Some(APP_NAME.to_string());
    let client = Client::with_options(options).context("MongoDB client init error")?;

    let db = client.database(&config.db_name);
    db.run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("MongoDB is not reachable (database {})", config.db_name))?;
    info!("connected to MongoDB database {}", config.db_name);
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn malformed_uri_is_reported() {
        let config = DatabaseConfig { url: "localhost:27017".to_string(), db_name: "brokerage".to_string() };
        let err = connect(&config).await.unwrap_err();
        assert!(err.to_string().contains("MongoDB URI parse error"));
    }
}
