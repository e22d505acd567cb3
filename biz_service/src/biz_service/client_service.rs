use crate::biz_service::client_role_service::ClientRoleService;
use crate::biz_service::ref_loader::RefIds;
use crate::biz_service::stats::{GroupCount, count_if, group_counts, group_counts_unwind, overview};
use crate::entitys::client_entity::{CLIENT_COLLECTION, ClientEntity, ClientView};
use common::errors::{AppError, is_duplicate_key};
use common::query_builder::{PageRequest, QueryBuilder};
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::date_util::now;
use log::info;
use mongodb::Database;
use mongodb::bson::{Document, doc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientOverview {
    pub total_clients: i64,
    pub active_clients: i64,
    pub inactive_clients: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub overview: ClientOverview,
    pub by_type: Vec<GroupCount>,
    pub by_lead_source: Vec<GroupCount>,
    pub by_role: Vec<GroupCount>,
}

/// 邮箱 / 电话重复检查结果
#[derive(Debug, Clone, Default, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub email_exists: bool,
    pub phone_exists: bool,
}

impl DuplicateCheck {
    pub fn has_duplicates(&self) -> bool {
        self.email_exists || self.phone_exists
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match (self.email_exists, self.phone_exists) {
            (true, true) => Err(AppError::Validation("A client with this email and phone already exists".into())),
            (true, false) => Err(AppError::Validation("A client with this email already exists".into())),
            (false, true) => Err(AppError::Validation("A client with this phone number already exists".into())),
            (false, false) => Ok(()),
        }
    }
}

pub fn duplicate_filter(field: &str, value: &str, exclude_id: Option<&str>) -> Document {
    let query = QueryBuilder::new().eq(field, value);
    match exclude_id {
        Some(id) => query.ne("_id", id).build(),
        None => query.build(),
    }
}

#[derive(Debug)]
pub struct ClientService {
    pub dao: BaseRepository<ClientEntity>,
}

impl ClientService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(CLIENT_COLLECTION);
        Self { dao: BaseRepository::new(collection) }
    }

    pub fn init(db: Database) {
        let instance = Self::new(db);
        INSTANCE.set(Arc::new(instance)).expect("INSTANCE already initialized");
    }

    /// 获取单例
    pub fn get() -> Arc<Self> {
        INSTANCE.get().expect("INSTANCE is not initialized").clone()
    }

    pub async fn find(&self, id: &str) -> Result<ClientEntity, AppError> {
        self.dao.find_by_id(id).await?.ok_or_else(|| AppError::not_found("Client"))
    }

    pub async fn check_duplicates(&self, email: Option<&str>, phone: Option<&str>, exclude_id: Option<&str>) -> Result<DuplicateCheck, AppError> {
        let mut check = DuplicateCheck::default();
        if let Some(email) = email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) {
            check.email_exists = self.dao.exists(duplicate_filter("email", &email, exclude_id)).await?;
        }
        if let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) {
            check.phone_exists = self.dao.exists(duplicate_filter("phone", phone, exclude_id)).await?;
        }
        Ok(check)
    }

    pub async fn create(&self, client: ClientEntity) -> Result<ClientEntity, AppError> {
        self.check_duplicates(Some(&client.email), Some(&client.phone), None).await?.into_result()?;
        self.dao.insert(&client).await.map_err(map_duplicate)?;
        info!("client created: {} {}", client.id, client.email);
        Ok(client)
    }

    pub async fn update(&self, mut client: ClientEntity) -> Result<ClientEntity, AppError> {
        self.check_duplicates(Some(&client.email), Some(&client.phone), Some(&client.id)).await?.into_result()?;
        client.updated_at = now();
        let matched = self.dao.save(&client.id, &client).await.map_err(map_duplicate)?;
        if matched == 0 {
            return Err(AppError::not_found("Client"));
        }
        Ok(client)
    }

    /// 删除客户及其全部角色
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.find(id).await?;
        let roles = ClientRoleService::get().dao.delete(doc! { "clientId": id }).await?;
        self.dao.delete_by_id(id).await?;
        info!("client deleted: {} ({} roles removed)", id, roles);
        Ok(())
    }

    /// 姓名、邮箱或电话模糊匹配的客户 id
    pub async fn search_ids(&self, search: &str) -> Result<Vec<String>, AppError> {
        let clients = self.dao.find_many(search_filter(search), None).await?;
        Ok(clients.into_iter().map(|c| c.id).collect())
    }

    pub async fn list(&self, filter: Document, page: &PageRequest) -> Result<PageResult<ClientView>, AppError> {
        let result = self.dao.query_page(filter, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn view(&self, id: &str) -> Result<ClientView, AppError> {
        let client = self.find(id).await?;
        self.to_view(client).await
    }

    pub async fn to_view(&self, client: ClientEntity) -> Result<ClientView, AppError> {
        let mut views = self.to_views(vec![client]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Client"))
    }

    pub async fn to_views(&self, clients: Vec<ClientEntity>) -> Result<Vec<ClientView>, AppError> {
        let mut ids = RefIds::new();
        for c in &clients {
            ids.user(c.assigned_to.as_ref());
        }
        let refs = ids.load().await?;
        Ok(clients
            .into_iter()
            .map(|client| ClientView { status_display: client.status_display(), assignee: refs.user(client.assigned_to.as_ref()), client })
            .collect())
    }

    pub async fn stats(&self) -> Result<ClientStats, AppError> {
        let accumulators = doc! {
            "totalClients": { "$sum": 1 },
            "activeClients": count_if("status", "active"),
            "inactiveClients": count_if("status", "inactive"),
        };
        Ok(ClientStats {
            overview: overview(&self.dao, doc! {}, accumulators).await?,
            by_type: group_counts(&self.dao, doc! {}, "type").await?,
            by_lead_source: group_counts(&self.dao, doc! {}, "leadSource").await?,
            by_role: group_counts_unwind(&self.dao, doc! {}, "activeRoles").await?,
        })
    }
}

/// name / email / phone 任一字段包含关键字
pub fn search_filter(search: &str) -> Document {
    QueryBuilder::new().like("name", search).or().like("email", search).or().like("phone", search).build()
}

fn map_duplicate(e: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&e) {
        AppError::Validation("A client with this email or phone already exists".into())
    } else {
        AppError::Mongo(e)
    }
}

static INSTANCE: OnceCell<Arc<ClientService>> = OnceCell::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_filter_excludes_self() {
        assert_eq!(duplicate_filter("email", "a@b.com", None), doc! { "email": "a@b.com" });
        assert_eq!(duplicate_filter("phone", "9876543210", Some("abc")), doc! { "phone": "9876543210", "_id": { "$ne": "abc" } });
    }

    #[test]
    fn duplicate_messages() {
        assert!(DuplicateCheck::default().into_result().is_ok());
        let err = DuplicateCheck { email_exists: true, phone_exists: false }.into_result().unwrap_err();
        assert_eq!(err.to_string(), "A client with this email already exists");
        assert!(DuplicateCheck { email_exists: false, phone_exists: true }.has_duplicates());
    }

    #[test]
    fn search_filter_escapes_input() {
        let filter = search_filter("a+b");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].as_document().unwrap().get_document("name").unwrap().get_str("$regex").unwrap(), r"a\+b");
    }
}
