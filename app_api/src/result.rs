use actix_web::HttpResponse;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::web::{JsonConfig, PathConfig, QueryConfig};
use common::config::AppConfig;
use common::errors::AppError;
use common::repository_util::PageResult;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config, started_at: Instant::now() }
    }
}

fn to_value<T: Serialize>(data: T) -> Value {
    serde_json::to_value(data).unwrap_or(Value::Null)
}

pub fn result_msg(msg: &str) -> Value {
    json!({ "message": msg })
}

/// `{ <key>: data }`
pub fn result_data<T: Serialize>(key: &str, data: T) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), to_value(data));
    Value::Object(map)
}

/// `{ message, <key>: data }`
pub fn result_msg_data<T: Serialize>(msg: &str, key: &str, data: T) -> Value {
    let mut value = result_data(key, data);
    if let Value::Object(map) = &mut value {
        map.insert("message".to_string(), Value::String(msg.to_string()));
    }
    value
}

/// `{ <key>: items, pagination }`
pub fn result_page<T: Serialize>(key: &str, page: PageResult<T>) -> Value {
    let mut value = result_data(key, page.items);
    if let Value::Object(map) = &mut value {
        map.insert("pagination".to_string(), to_value(page.pagination));
    }
    value
}

pub fn created(body: Value) -> HttpResponse {
    HttpResponse::Created().json(body)
}

/// 请求体、查询参数、路径参数解析失败统一返回 400
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err: JsonPayloadError, _req| AppError::Validation(err.to_string()).into())
}

pub fn query_config() -> QueryConfig {
    QueryConfig::default().error_handler(|err: QueryPayloadError, _req| AppError::Validation(err.to_string()).into())
}

pub fn path_config() -> PathConfig {
    PathConfig::default().error_handler(|err: PathError, _req| AppError::Validation(err.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::query_builder::PageRequest;
    use common::repository_util::Pagination;

    #[test]
    fn page_envelope_uses_resource_key() {
        let page = PageRequest::new(Some(1), Some(2), None, None).unwrap();
        let value = result_page("clients", PageResult { items: vec![1, 2], pagination: Pagination::new(&page, 3) });
        assert_eq!(value["clients"], json!([1, 2]));
        assert_eq!(value["pagination"]["totalPages"], 2);
        assert_eq!(value["pagination"]["hasNextPage"], true);
    }

    #[test]
    fn message_envelope() {
        let value = result_msg_data("Client created successfully", "client", json!({ "name": "Asha" }));
        assert_eq!(value["message"], "Client created successfully");
        assert_eq!(value["client"]["name"], "Asha");
        assert_eq!(result_msg("ok"), json!({ "message": "ok" }));
    }
}
