use crate::entitys::client_role_entity::RoleType;
use crate::entitys::common_entity::{NumberRange, PropertyType};
use crate::entitys::user_entity::UserBrief;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

pub const CLIENT_COLLECTION: &str = "clients";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClientType {
    #[default]
    Individual,
    Broker,
    Agency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

/// 客户来源渠道
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LeadSource {
    Website,
    WalkIn,
    Instagram,
    Facebook,
    Referral,
    Google,
    #[default]
    Other,
}

/// 客户的购房偏好
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientPreferences {
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub budget: NumberRange,
    #[serde(default)]
    #[validate(nested)]
    pub area: NumberRange,
}

/// 客户档案
///
/// `activeRoles` 与 `status` 由客户角色派生，见 `ClientRoleService::recompute_client`
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["email"], unique)]
#[mongo_index(fields["phone"], unique)]
#[mongo_index(fields["type", "status"])]
#[mongo_index(fields["assignedTo"])]
#[mongo_index(fields["location"])]
#[mongo_index(fields["leadSource"])]
#[mongo_index(fields["tags"])]
#[mongo_index(fields["activeRoles"])]
#[mongo_index(fields["createdAt"], order = "desc")]
pub struct ClientEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// 小写存储
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type", default)]
    pub client_type: ClientType,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub active_roles: Vec<RoleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub lead_source: LeadSource,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub preferences: ClientPreferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ClientEntity {
    pub fn status_display(&self) -> String {
        status_display(self.status, &self.active_roles)
    }
}

/// `Inactive` / `Active (No Roles)` / `Active (Buyer, Reference)`
pub fn status_display(status: ClientStatus, roles: &[RoleType]) -> String {
    if status == ClientStatus::Inactive {
        return "Inactive".to_string();
    }
    if roles.is_empty() {
        return "Active (No Roles)".to_string();
    }
    let labels = roles.iter().map(|r| r.label()).collect::<Vec<_>>();
    format!("Active ({})", labels.join(", "))
}

/// 被引用时返回的客户摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientBrief {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub status: ClientStatus,
}

impl From<&ClientEntity> for ClientBrief {
    fn from(c: &ClientEntity) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            client_type: c.client_type,
            status: c.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(flatten)]
    pub client: ClientEntity,
    pub status_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_display_variants() {
        assert_eq!(status_display(ClientStatus::Inactive, &[RoleType::Buyer]), "Inactive");
        assert_eq!(status_display(ClientStatus::Active, &[]), "Active (No Roles)");
        assert_eq!(status_display(ClientStatus::Active, &[RoleType::Buyer, RoleType::Referrer]), "Active (Buyer, Reference)");
    }

    #[test]
    fn lead_source_uses_kebab_case() {
        assert_eq!(serde_json::to_value(LeadSource::WalkIn).unwrap(), "walk-in");
        assert_eq!(LeadSource::from_str("walk-in").unwrap(), LeadSource::WalkIn);
        assert!(LeadSource::from_str("tv").is_err());
    }

    #[test]
    fn entity_serializes_with_mongo_field_names() {
        let client = ClientEntity { id: "a".repeat(24), name: "Asha".into(), client_type: ClientType::Broker, ..Default::default() };
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["_id"], "a".repeat(24));
        assert_eq!(json["type"], "broker");
        assert_eq!(json["leadSource"], "other");
        assert!(json.get("address").is_none());
    }

    #[test]
    fn view_flattens_entity() {
        let client = ClientEntity { name: "Ravi".into(), active_roles: vec![RoleType::Seller], ..Default::default() };
        let view = ClientView { status_display: client.status_display(), client, assignee: None };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Ravi");
        assert_eq!(json["statusDisplay"], "Active (Seller)");
        assert_eq!(json["activeRoles"][0], "seller");
    }
}
