use crate::biz_service::client_service::ClientService;
use crate::biz_service::property_service::PropertyService;
use crate::biz_service::ref_loader::RefIds;
use crate::entitys::client_role_entity::{CLIENT_ROLE_COLLECTION, ClientRoleEntity, ClientRoleView, derive_client_activity};
use common::errors::{AppError, is_duplicate_key};
use common::query_builder::PageRequest;
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::date_util::now;
use log::{error, info};
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc, to_bson};
use once_cell::sync::OnceCell;
use std::sync::Arc;

const DUPLICATE_ROLE: &str = "This client already has this role for the selected property";

#[derive(Debug)]
pub struct ClientRoleService {
    pub dao: BaseRepository<ClientRoleEntity>,
}

impl ClientRoleService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(CLIENT_ROLE_COLLECTION);
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

    pub async fn find(&self, id: &str) -> Result<ClientRoleEntity, AppError> {
        self.dao.find_by_id(id).await?.ok_or_else(|| AppError::not_found("Client role"))
    }

    /// 客户与物业必须存在；同一客户在同一物业上的同一角色只能有一条
    pub async fn create(&self, role: ClientRoleEntity) -> Result<ClientRoleEntity, AppError> {
        ClientService::get().find(&role.client_id).await?;
        if let Some(property_id) = &role.property_id {
            PropertyService::get().find(property_id).await?;
        }
        if self.dao.exists(identity_filter(&role)).await? {
            return Err(AppError::Validation(DUPLICATE_ROLE.into()));
        }
        self.dao.insert(&role).await.map_err(map_duplicate)?;
        info!("client role created: {} {} for client {}", role.id, role.role, role.client_id);
        self.refresh_client(&role.client_id).await;
        Ok(role)
    }

    pub async fn update(&self, mut role: ClientRoleEntity) -> Result<ClientRoleEntity, AppError> {
        role.updated_at = now();
        if self.dao.save(&role.id, &role).await? == 0 {
            return Err(AppError::not_found("Client role"));
        }
        self.refresh_client(&role.client_id).await;
        Ok(role)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let role = self.find(id).await?;
        self.dao.delete_by_id(id).await?;
        self.refresh_client(&role.client_id).await;
        Ok(())
    }

    /// 重新计算客户的 `activeRoles` / `status`，失败只记录日志
    pub async fn refresh_client(&self, client_id: &str) {
        if let Err(e) = self.recompute_client(client_id).await {
            error!("recompute client {} status failed: {:?}", client_id, e);
        }
    }

    async fn recompute_client(&self, client_id: &str) -> Result<(), AppError> {
        let roles = self.dao.find_many(doc! { "clientId": client_id, "status": "active" }, None).await?;
        let (active_roles, status) = derive_client_activity(&roles);
        let update = doc! {
            "$set": {
                "activeRoles": to_bson(&active_roles)?,
                "status": status.as_ref(),
                "updatedAt": now(),
            }
        };
        ClientService::get().dao.collection.update_one(doc! { "_id": client_id }, update).await?;
        Ok(())
    }

    pub async fn list(&self, filter: Document, page: &PageRequest) -> Result<PageResult<ClientRoleView>, AppError> {
        let result = self.dao.query_page(filter, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    /// 按客户或物业列出全部角色，新建的在前
    pub async fn list_all(&self, filter: Document) -> Result<Vec<ClientRoleView>, AppError> {
        let roles = self.dao.find_many(filter, Some(doc! { "createdAt": -1 })).await?;
        self.to_views(roles).await
    }

    pub async fn view(&self, id: &str) -> Result<ClientRoleView, AppError> {
        let role = self.find(id).await?;
        self.to_view(role).await
    }

    pub async fn to_view(&self, role: ClientRoleEntity) -> Result<ClientRoleView, AppError> {
        let mut views = self.to_views(vec![role]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Client role"))
    }

    pub async fn to_views(&self, roles: Vec<ClientRoleEntity>) -> Result<Vec<ClientRoleView>, AppError> {
        let mut ids = RefIds::new();
        for r in &roles {
            ids.client(Some(&r.client_id)).property(r.property_id.as_ref()).user(r.assigned_to.as_ref());
        }
        let refs = ids.load().await?;
        Ok(roles
            .into_iter()
            .map(|role| ClientRoleView {
                commission_display: role.commission_display(),
                client: refs.client(Some(&role.client_id)),
                property: refs.property(role.property_id.as_ref()),
                assignee: refs.user(role.assigned_to.as_ref()),
                role,
            })
            .collect())
    }
}

/// (clientId, role, propertyId)，没有物业时匹配 null
pub fn identity_filter(role: &ClientRoleEntity) -> Document {
    let property = role.property_id.clone().map(Bson::String).unwrap_or(Bson::Null);
    doc! { "clientId": &role.client_id, "role": role.role.as_ref(), "propertyId": property }
}

fn map_duplicate(e: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&e) { AppError::Validation(DUPLICATE_ROLE.into()) } else { AppError::Mongo(e) }
}

static INSTANCE: OnceCell<Arc<ClientRoleService>> = OnceCell::new();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitys::client_role_entity::RoleType;

    #[test]
    fn identity_filter_treats_missing_property_as_null() {
        let role = ClientRoleEntity { client_id: "c1".into(), role: RoleType::Referrer, ..Default::default() };
        assert_eq!(identity_filter(&role), doc! { "clientId": "c1", "role": "referrer", "propertyId": Bson::Null });

        let role = ClientRoleEntity { client_id: "c1".into(), role: RoleType::Seller, property_id: Some("p1".into()), ..Default::default() };
        assert_eq!(identity_filter(&role), doc! { "clientId": "c1", "role": "seller", "propertyId": "p1" });
    }
}
