pub mod auth;
pub mod client;
pub mod client_role;
pub mod common_handler;
pub mod lookout;
pub mod property;
pub mod referral;
pub mod swagger;
pub mod task;
pub mod thread;

use actix_web::web;
use common::errors::AppError;
use common::util::validate::is_object_id;
use mongodb::bson::{Bson, Document, doc};

pub fn configure(cfg: &mut web::ServiceConfig) {
    common_handler::configure(cfg);
    swagger::configure(cfg);
    auth::configure(cfg);
    client::configure(cfg);
    property::configure(cfg);
    client_role::configure(cfg);
    referral::configure(cfg);
    lookout::configure(cfg);
    task::configure(cfg);
    thread::configure(cfg);
}

/// 路径中的 id 不是合法 ObjectId 时直接 404
pub fn check_id(id: &str, what: &str) -> Result<(), AppError> {
    if is_object_id(id) { Ok(()) } else { Err(AppError::not_found(what)) }
}

/// 把搜索命中的客户 id 合并进 `field` 条件；已有精确值时取交集
pub fn merge_id_filter(filter: &mut Document, field: &str, ids: Vec<String>) {
    let narrowed: Vec<String> = match filter.get(field) {
        Some(Bson::String(current)) => ids.into_iter().filter(|id| id == current).collect(),
        _ => ids,
    };
    filter.insert(field, doc! { "$in": narrowed });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(check_id("507f1f77bcf86cd799439011", "Client").is_ok());
        let err = check_id("abc", "Client").unwrap_err();
        assert_eq!(err.to_string(), "Client not found");
    }

    #[test]
    fn search_ids_replace_missing_field() {
        let mut filter = doc! { "status": "active" };
        merge_id_filter(&mut filter, "clientId", vec!["a".into(), "b".into()]);
        assert_eq!(filter, doc! { "status": "active", "clientId": { "$in": ["a", "b"] } });
    }

    #[test]
    fn search_ids_intersect_with_exact_value() {
        let mut filter = doc! { "clientId": "b" };
        merge_id_filter(&mut filter, "clientId", vec!["a".into(), "b".into()]);
        assert_eq!(filter, doc! { "clientId": { "$in": ["b"] } });

        let mut filter = doc! { "clientId": "c" };
        merge_id_filter(&mut filter, "clientId", vec!["a".into()]);
        assert_eq!(filter, doc! { "clientId": { "$in": Bson::Array(vec![]) } });
    }
}
