use crate::biz_service::client_role_service::ClientRoleService;
use crate::biz_service::client_service::ClientService;
use crate::biz_service::ref_loader::RefIds;
use crate::entitys::client_entity::ClientEntity;
use crate::entitys::client_role_entity::{ClientRoleEntity, RoleType};
use crate::entitys::property_entity::{OwnerType, PROPERTY_COLLECTION, PropertyEntity, PropertyView};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::common_utils::build_id;
use common::util::date_util::{current_year, now};
use log::{info, warn};
use mongodb::Database;
use mongodb::bson::{Document, doc};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 业主 / 推荐人：引用已有客户，或随物业新建
#[derive(Debug, Clone)]
pub enum PartyInput {
    Existing(String),
    New(ClientEntity),
}

impl PartyInput {
    pub fn kind(&self) -> OwnerType {
        match self {
            PartyInput::Existing(_) => OwnerType::Existing,
            PartyInput::New(_) => OwnerType::New,
        }
    }
}

#[derive(Debug)]
pub struct PropertyService {
    pub dao: BaseRepository<PropertyEntity>,
}

impl PropertyService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(PROPERTY_COLLECTION);
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

    /// 已软删除的物业视为不存在
    pub async fn find(&self, id: &str) -> Result<PropertyEntity, AppError> {
        self.dao
            .find_one(doc! { "_id": id, "isActive": true })
            .await?
            .ok_or_else(|| AppError::not_found("Property"))
    }

    /// 新建业主 / 推荐人时同时为其建立 seller / referrer 角色；
    /// 两方先全部校验再写库，后续步骤失败时删除本次新建的客户及物业
    pub async fn create(&self, mut property: PropertyEntity, owner: PartyInput, reference: Option<PartyInput>) -> Result<PropertyEntity, AppError> {
        check_party_conflict(&owner, reference.as_ref())?;
        self.verify_party(&owner, "Owner client").await?;
        if let Some(reference) = &reference {
            self.verify_party(reference, "Reference client").await?;
        }

        let mut created = vec![];
        match self.insert_with_parties(&mut property, owner, reference, &mut created).await {
            Ok(()) => Ok(property),
            Err(e) => {
                if !created.is_empty() {
                    if let Err(cleanup) = self.dao.delete_by_id(&property.id).await {
                        warn!("failed to remove property {} after create error: {}", property.id, cleanup);
                    }
                }
                let clients = ClientService::get();
                for id in &created {
                    if let Err(cleanup) = clients.delete(id).await {
                        warn!("failed to remove client {} after property create error: {}", id, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    /// 已有客户必须存在；新客户的邮箱 / 电话不能与库中重复
    async fn verify_party(&self, party: &PartyInput, what: &str) -> Result<(), AppError> {
        let clients = ClientService::get();
        match party {
            PartyInput::Existing(id) => {
                clients.dao.find_by_id(id).await?.ok_or_else(|| AppError::not_found(what))?;
            }
            PartyInput::New(client) => {
                clients.check_duplicates(Some(&client.email), Some(&client.phone), None).await?.into_result()?;
            }
        }
        Ok(())
    }

    async fn insert_with_parties(
        &self,
        property: &mut PropertyEntity,
        owner: PartyInput,
        reference: Option<PartyInput>,
        created: &mut Vec<String>,
    ) -> Result<(), AppError> {
        property.owner_type = owner.kind();
        property.owner = persist_party(owner, created).await?;
        if let Some(reference) = reference {
            property.ref_type = Some(reference.kind());
            property.ref_client = Some(persist_party(reference, created).await?);
        }
        property.normalize();
        self.dao.insert(property).await?;
        info!("property created: {} by {}", property.id, property.created_by);

        let roles = ClientRoleService::get();
        if property.owner_type == OwnerType::New {
            roles.create(party_role(property, &property.owner, RoleType::Seller)).await?;
        }
        if let (Some(OwnerType::New), Some(ref_id)) = (property.ref_type, property.ref_client.as_ref()) {
            roles.create(party_role(property, ref_id, RoleType::Referrer)).await?;
        }
        Ok(())
    }

    /// 业主与推荐人不可修改，总价随面积 / 单价重算
    pub async fn update(&self, mut property: PropertyEntity) -> Result<PropertyEntity, AppError> {
        property.normalize();
        property.updated_at = now();
        if self.dao.save(&property.id, &property).await? == 0 {
            return Err(AppError::not_found("Property"));
        }
        Ok(property)
    }

    pub async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        self.find(id).await?;
        self.dao.update(doc! { "_id": id }, doc! { "$set": { "isActive": false, "updatedAt": now() } }).await?;
        info!("property deactivated: {}", id);
        Ok(())
    }

    pub async fn list(&self, filter: Document, page: &PageRequest) -> Result<PageResult<PropertyView>, AppError> {
        let result = self.dao.query_page(filter, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn view(&self, id: &str) -> Result<PropertyView, AppError> {
        let property = self.find(id).await?;
        self.to_view(property).await
    }

    pub async fn to_view(&self, property: PropertyEntity) -> Result<PropertyView, AppError> {
        let mut views = self.to_views(vec![property]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Property"))
    }

    pub async fn to_views(&self, properties: Vec<PropertyEntity>) -> Result<Vec<PropertyView>, AppError> {
        let mut ids = RefIds::new();
        for p in &properties {
            ids.client(Some(&p.owner))
                .client(p.ref_client.as_ref())
                .user(Some(&p.created_by))
                .user(p.assigned_to.as_ref());
        }
        let refs = ids.load().await?;
        let year = current_year();
        Ok(properties
            .into_iter()
            .map(|property| PropertyView {
                age_display: property.age.display(year),
                owner_info: refs.client(Some(&property.owner)),
                reference_client: refs.client(property.ref_client.as_ref()),
                creator: refs.user(Some(&property.created_by)),
                assignee: refs.user(property.assigned_to.as_ref()),
                property,
            })
            .collect())
    }
}

async fn persist_party(party: PartyInput, created: &mut Vec<String>) -> Result<String, AppError> {
    match party {
        PartyInput::Existing(id) => Ok(id),
        PartyInput::New(client) => {
            let client = ClientService::get().create(client).await?;
            created.push(client.id.clone());
            Ok(client.id)
        }
    }
}

/// 同时新建的业主与推荐人不能共用邮箱或电话
pub fn check_party_conflict(owner: &PartyInput, reference: Option<&PartyInput>) -> Result<(), AppError> {
    if let (PartyInput::New(a), Some(PartyInput::New(b))) = (owner, reference) {
        if !a.email.is_empty() && a.email.eq_ignore_ascii_case(&b.email) {
            return Err(AppError::Validation("Owner and reference client cannot share an email".into()));
        }
        if !a.phone.is_empty() && a.phone.trim() == b.phone.trim() {
            return Err(AppError::Validation("Owner and reference client cannot share a phone number".into()));
        }
    }
    Ok(())
}

/// 新建业主 / 推荐人对应的角色记录
pub fn party_role(property: &PropertyEntity, client_id: &str, role: RoleType) -> ClientRoleEntity {
    let now = now();
    ClientRoleEntity {
        id: build_id(),
        client_id: client_id.to_string(),
        role,
        property_id: Some(property.id.clone()),
        assigned_to: property.assigned_to.clone().or_else(|| Some(property.created_by.clone())),
        created_at: now,
        updated_at: now,
        ..Default::default()
    }
}

static INSTANCE: OnceCell<Arc<PropertyService>> = OnceCell::new();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitys::client_role_entity::RoleStatus;

    #[test]
    fn party_role_links_property_and_defaults_assignee() {
        let property = PropertyEntity { id: "p1".into(), created_by: "u1".into(), ..Default::default() };
        let role = party_role(&property, "c1", RoleType::Seller);
        assert_eq!(role.client_id, "c1");
        assert_eq!(role.property_id.as_deref(), Some("p1"));
        assert_eq!(role.assigned_to.as_deref(), Some("u1"));
        assert_eq!(role.status, RoleStatus::Active);
        assert_eq!(role.id.len(), 24);
    }

    #[test]
    fn party_input_kind() {
        assert_eq!(PartyInput::Existing("c".into()).kind(), OwnerType::Existing);
        assert_eq!(PartyInput::New(ClientEntity::default()).kind(), OwnerType::New);
    }

    fn new_client(email: &str, phone: &str) -> PartyInput {
        PartyInput::New(ClientEntity { email: email.into(), phone: phone.into(), ..Default::default() })
    }

    #[test]
    fn inline_parties_cannot_share_contact() {
        let owner = new_client("owner@example.com", "+91 9876543210");
        let err = check_party_conflict(&owner, Some(&new_client("OWNER@example.com", "+91 9000000000"))).unwrap_err();
        assert_eq!(err.to_string(), "Owner and reference client cannot share an email");
        assert!(check_party_conflict(&owner, Some(&new_client("ref@example.com", "+91 9876543210"))).is_err());
        assert!(check_party_conflict(&owner, Some(&new_client("ref@example.com", "+91 9000000000"))).is_ok());
    }

    #[test]
    fn existing_parties_skip_conflict_check() {
        let owner = new_client("a@example.com", "+91 9876543210");
        assert!(check_party_conflict(&owner, None).is_ok());
        assert!(check_party_conflict(&owner, Some(&PartyInput::Existing("c1".into()))).is_ok());
        assert!(check_party_conflict(&PartyInput::Existing("c1".into()), Some(&owner)).is_ok());
    }
}
