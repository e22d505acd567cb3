use crate::entitys::client_entity::{ClientBrief, ClientStatus};
use crate::entitys::common_entity::{CommissionType, DEFAULT_CURRENCY, commission_text};
use crate::entitys::property_entity::PropertyBrief;
use crate::entitys::user_entity::UserBrief;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

pub const CLIENT_ROLE_COLLECTION: &str = "clientroles";

/// 客户在交易中的角色；声明顺序即展示顺序
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleType {
    #[default]
    Buyer,
    Seller,
    Referrer,
}

impl RoleType {
    pub fn label(&self) -> &'static str {
        match self {
            RoleType::Buyer => "Buyer",
            RoleType::Seller => "Seller",
            RoleType::Referrer => "Reference",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleStatus {
    #[default]
    Active,
    Inactive,
    Completed,
    Cancelled,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleCommission {
    #[serde(rename = "type", default)]
    pub commission_type: CommissionType,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Commission value cannot be negative"))]
    pub value: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for RoleCommission {
    fn default() -> Self {
        Self { commission_type: CommissionType::Fixed, value: 0.0, currency: default_currency() }
    }
}

/// 客户角色：一个客户在某个物业（或全局）上的买方/卖方/推荐人身份
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["clientId", "role", "propertyId"], unique, name = "client_role_property_unique")]
#[mongo_index(fields["clientId", "status"])]
#[mongo_index(fields["propertyId"])]
#[mongo_index(fields["assignedTo"])]
#[mongo_index(fields["createdAt"], order = "desc")]
pub struct ClientRoleEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_id: String,
    pub role: RoleType,
    /// 为空时存为 null，唯一索引把它当作同一个值
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub status: RoleStatus,
    #[serde(default)]
    pub commission: RoleCommission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ClientRoleEntity {
    /// value 为 0 时不展示
    pub fn commission_display(&self) -> Option<String> {
        if self.commission.value == 0.0 {
            return None;
        }
        Some(commission_text(self.commission.commission_type, self.commission.value))
    }
}

/// 由客户的全部角色推导 `activeRoles` 与 `status`
///
/// 只统计 `status == active` 的角色，去重后按 buyer、seller、referrer 排序；集合为空则客户为 inactive
pub fn derive_client_activity<'a>(roles: impl IntoIterator<Item = &'a ClientRoleEntity>) -> (Vec<RoleType>, ClientStatus) {
    let active = roles
        .into_iter()
        .filter(|r| r.status == RoleStatus::Active)
        .map(|r| r.role)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let status = if active.is_empty() { ClientStatus::Inactive } else { ClientStatus::Active };
    (active, status)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientRoleView {
    #[serde(flatten)]
    pub role: ClientRoleEntity,
    pub commission_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserBrief>,
}
