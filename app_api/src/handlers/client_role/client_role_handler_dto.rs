use biz_service::entitys::client_role_entity::{ClientRoleEntity, RoleCommission, RoleStatus, RoleType};
use biz_service::entitys::common_entity::CommissionType;
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::OrderType;
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::query_util::empty_as_none;
use common::util::validate::validate_object_id;
use mongo_macro::QueryFilter;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams, QueryFilter)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientRoleListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_order: Option<OrderType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "role")]
    pub role: Option<RoleType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "status")]
    pub status: Option<RoleStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "clientId")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "propertyId")]
    pub property_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "assignedTo")]
    pub assigned_to: Option<String>,
    /// 按客户姓名 / 邮箱 / 电话搜索
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
}

impl ClientRoleListQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), self.sort_order)
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRoleDto {
    #[validate(custom(function = "validate_object_id"))]
    pub client_id: String,
    pub role: RoleType,
    #[validate(custom(function = "validate_object_id"))]
    pub property_id: Option<String>,
    #[serde(default)]
    pub status: RoleStatus,
    #[serde(default)]
    #[validate(nested)]
    pub commission: RoleCommission,
    #[validate(length(max = 500, message = "Relationship note cannot exceed 500 characters"))]
    pub relationship_note: Option<String>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl CreateClientRoleDto {
    pub fn normalize(&mut self) {
        self.property_id = trim_to_option(self.property_id.take());
        self.relationship_note = trim_to_option(self.relationship_note.take());
        self.notes = trim_to_option(self.notes.take());
        self.assigned_to = trim_to_option(self.assigned_to.take());
    }

    pub fn into_entity(self, caller: &str) -> ClientRoleEntity {
        let now = now();
        ClientRoleEntity {
            id: build_id(),
            client_id: self.client_id,
            role: self.role,
            property_id: self.property_id,
            status: self.status,
            commission: self.commission,
            relationship_note: self.relationship_note,
            notes: self.notes,
            assigned_to: self.assigned_to.or_else(|| Some(caller.to_string())),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 佣金部分更新，未传字段保持原值
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleCommissionPatch {
    #[serde(rename = "type")]
    pub commission_type: Option<CommissionType>,
    #[validate(range(min = 0.0, message = "Commission value cannot be negative"))]
    pub value: Option<f64>,
    pub currency: Option<String>,
}

impl RoleCommissionPatch {
    pub fn apply(self, commission: &mut RoleCommission) {
        if let Some(commission_type) = self.commission_type {
            commission.commission_type = commission_type;
        }
        if let Some(value) = self.value {
            commission.value = value;
        }
        if let Some(currency) = trim_to_option(self.currency) {
            commission.currency = currency;
        }
    }
}

/// clientId / role / propertyId 不可修改
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRoleDto {
    pub status: Option<RoleStatus>,
    #[validate(nested)]
    pub commission: Option<RoleCommissionPatch>,
    #[validate(length(max = 500, message = "Relationship note cannot exceed 500 characters"))]
    pub relationship_note: Option<String>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl UpdateClientRoleDto {
    pub fn apply(self, role: &mut ClientRoleEntity) {
        if let Some(status) = self.status {
            role.status = status;
        }
        if let Some(patch) = self.commission {
            patch.apply(&mut role.commission);
        }
        if let Some(note) = self.relationship_note {
            role.relationship_note = trim_to_option(Some(note));
        }
        if let Some(notes) = self.notes {
            role.notes = trim_to_option(Some(notes));
        }
        if let Some(assigned_to) = self.assigned_to {
            role.assigned_to = trim_to_option(Some(assigned_to));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;
    use serde_json::json;

    const CLIENT: &str = "507f1f77bcf86cd799439011";
    const USER: &str = "507f1f77bcf86cd799439099";

    #[test]
    fn list_query_filter() {
        let q = Query::<ClientRoleListQuery>::from_query(&format!("role=referrer&status=completed&clientId={}", CLIENT)).unwrap();
        let filter = q.to_query_doc();
        assert_eq!(filter.get_str("role").unwrap(), "referrer");
        assert_eq!(filter.get_str("status").unwrap(), "completed");
        assert_eq!(filter.get_str("clientId").unwrap(), CLIENT);
        assert!(!filter.contains_key("propertyId"));
    }

    #[test]
    fn create_defaults() {
        let mut dto: CreateClientRoleDto = serde_json::from_value(json!({ "clientId": CLIENT, "role": "buyer", "propertyId": "" })).unwrap();
        dto.normalize();
        assert!(dto.validate().is_ok());
        let role = dto.into_entity(USER);
        assert_eq!(role.property_id, None);
        assert_eq!(role.status, RoleStatus::Active);
        assert_eq!(role.commission.currency, "INR");
        assert_eq!(role.commission.value, 0.0);
        assert_eq!(role.assigned_to.as_deref(), Some(USER));
    }

    #[test]
    fn create_requires_role_and_valid_ids() {
        assert!(serde_json::from_value::<CreateClientRoleDto>(json!({ "clientId": CLIENT })).is_err());
        let dto: CreateClientRoleDto =
            serde_json::from_value(json!({ "clientId": "bad", "role": "seller", "commission": { "value": -1.0 } })).unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = AppError::from(errors);
        let AppError::InvalidFields(fields) = fields else { panic!("expected field errors") };
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().any(|f| f.message == "Commission value cannot be negative"));
    }

    #[test]
    fn update_merges_commission() {
        let mut role: ClientRoleEntity = CreateClientRoleDto {
            client_id: CLIENT.into(),
            role: RoleType::Seller,
            property_id: None,
            status: RoleStatus::Active,
            commission: RoleCommission { commission_type: CommissionType::Percentage, value: 2.0, currency: "INR".into() },
            relationship_note: None,
            notes: None,
            assigned_to: None,
        }
        .into_entity(USER);
        let patch: UpdateClientRoleDto =
            serde_json::from_value(json!({ "status": "completed", "commission": { "value": 2.5 }, "clientId": "ignored" })).unwrap();
        patch.apply(&mut role);
        assert_eq!(role.status, RoleStatus::Completed);
        assert_eq!(role.commission.commission_type, CommissionType::Percentage);
        assert_eq!(role.commission.value, 2.5);
        assert_eq!(role.client_id, CLIENT);
    }
}
