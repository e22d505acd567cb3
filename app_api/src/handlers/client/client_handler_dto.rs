use biz_service::entitys::client_entity::{ClientEntity, ClientPreferences, ClientStatus, ClientType, LeadSource};
use biz_service::entitys::client_role_entity::RoleType;
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::OrderType;
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::query_util::empty_as_none;
use common::util::validate::{validate_object_id, validate_phone};
use mongo_macro::QueryFilter;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// 客户列表查询参数
#[derive(Debug, Default, Deserialize, IntoParams, QueryFilter)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_order: Option<OrderType>,
    #[serde(rename = "type", default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "type")]
    pub client_type: Option<ClientType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "status")]
    pub status: Option<ClientStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "leadSource")]
    pub lead_source: Option<LeadSource>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(like, field = "location")]
    pub location: Option<String>,
    /// 匹配 tags 中任一标签
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "tags")]
    pub tag: Option<String>,
    /// 匹配 activeRoles
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "activeRoles")]
    pub role: Option<RoleType>,
    /// 姓名 / 邮箱 / 电话模糊搜索
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
}

impl ClientListQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), self.sort_order)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub client_type: Option<ClientType>,
    pub location: Option<String>,
    pub lead_source: Option<LeadSource>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
    #[validate(nested)]
    pub preferences: Option<ClientPreferences>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl CreateClientDto {
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self.address = trim_to_option(self.address.take());
        self.location = trim_to_option(self.location.take());
        self.notes = trim_to_option(self.notes.take());
        self.assigned_to = trim_to_option(self.assigned_to.take());
        self.tags = normalize_tags(std::mem::take(&mut self.tags));
    }

    /// 未指定负责人时归当前用户
    pub fn into_entity(self, caller: &str) -> ClientEntity {
        let now = now();
        ClientEntity {
            id: build_id(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            client_type: self.client_type.unwrap_or_default(),
            status: ClientStatus::Active,
            active_roles: vec![],
            location: self.location,
            lead_source: self.lead_source.unwrap_or_default(),
            tags: self.tags,
            notes: self.notes,
            preferences: self.preferences.unwrap_or_default(),
            assigned_to: self.assigned_to.or_else(|| Some(caller.to_string())),
            created_at: now,
            updated_at: now,
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for tag in tags.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// 部分更新；activeRoles 由角色推导，不接受客户端写入
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub client_type: Option<ClientType>,
    pub status: Option<ClientStatus>,
    pub location: Option<String>,
    pub lead_source: Option<LeadSource>,
    pub tags: Option<Vec<String>>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
    #[validate(nested)]
    pub preferences: Option<ClientPreferences>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl UpdateClientDto {
    pub fn normalize(&mut self) {
        self.name = self.name.take().map(|s| s.trim().to_string());
        self.email = self.email.take().map(|s| s.trim().to_lowercase());
        self.phone = self.phone.take().map(|s| s.trim().to_string());
    }

    pub fn apply(self, client: &mut ClientEntity) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(email) = self.email {
            client.email = email;
        }
        if let Some(phone) = self.phone {
            client.phone = phone;
        }
        if let Some(address) = self.address {
            client.address = trim_to_option(Some(address));
        }
        if let Some(client_type) = self.client_type {
            client.client_type = client_type;
        }
        if let Some(status) = self.status {
            client.status = status;
        }
        if let Some(location) = self.location {
            client.location = trim_to_option(Some(location));
        }
        if let Some(lead_source) = self.lead_source {
            client.lead_source = lead_source;
        }
        if let Some(tags) = self.tags {
            client.tags = normalize_tags(tags);
        }
        if let Some(notes) = self.notes {
            client.notes = trim_to_option(Some(notes));
        }
        if let Some(preferences) = self.preferences {
            client.preferences = preferences;
        }
        if let Some(assigned_to) = self.assigned_to {
            client.assigned_to = trim_to_option(Some(assigned_to));
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckDuplicatesDto {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub exclude_id: Option<String>,
}

impl CheckDuplicatesDto {
    pub fn normalize(&mut self) {
        self.email = trim_to_option(self.email.take()).map(|e| e.to_lowercase());
        self.phone = trim_to_option(self.phone.take());
        self.exclude_id = trim_to_option(self.exclude_id.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;
    use mongodb::bson::doc;

    const USER: &str = "507f1f77bcf86cd799439011";

    fn create_dto() -> CreateClientDto {
        serde_json::from_value(serde_json::json!({
            "name": "  Asha Rao ",
            "email": " Asha@Example.com",
            "phone": " +91-9876543210 ",
            "tags": ["vip", " vip ", ""],
        }))
        .unwrap()
    }

    #[test]
    fn list_query_builds_filter() {
        let q = Query::<ClientListQuery>::from_query("type=broker&status=active&leadSource=walk-in&tag=vip&role=seller&location=a.b&page=2").unwrap();
        let filter = q.to_query_doc();
        assert_eq!(filter.get_str("type").unwrap(), "broker");
        assert_eq!(filter.get_str("status").unwrap(), "active");
        assert_eq!(filter.get_str("leadSource").unwrap(), "walk-in");
        assert_eq!(filter.get_str("tags").unwrap(), "vip");
        assert_eq!(filter.get_str("activeRoles").unwrap(), "seller");
        assert_eq!(filter.get_document("location").unwrap(), &doc! { "$regex": "a\\.b", "$options": "i" });
        assert_eq!(q.page().unwrap().page, 2);
    }

    #[test]
    fn list_query_ignores_blank_params() {
        let q = Query::<ClientListQuery>::from_query("type=&search=&assignedTo=").unwrap();
        assert!(q.to_query_doc().is_empty());
        assert!(q.search.is_none());
    }

    #[test]
    fn list_query_rejects_unknown_enum() {
        assert!(Query::<ClientListQuery>::from_query("status=archived").is_err());
    }

    #[test]
    fn create_normalizes_and_defaults() {
        let mut dto = create_dto();
        dto.normalize();
        assert!(dto.validate().is_ok());
        let client = dto.into_entity(USER);
        assert_eq!(client.name, "Asha Rao");
        assert_eq!(client.email, "asha@example.com");
        assert_eq!(client.phone, "+91-9876543210");
        assert_eq!(client.tags, vec!["vip".to_string()]);
        assert_eq!(client.assigned_to.as_deref(), Some(USER));
        assert_eq!(client.client_type, ClientType::Individual);
        assert_eq!(client.lead_source, LeadSource::Other);
        assert!(client.active_roles.is_empty());
    }

    #[test]
    fn create_reports_field_errors() {
        let mut dto = create_dto();
        dto.normalize();
        dto.name = "A".into();
        dto.phone = "123".into();
        dto.assigned_to = Some("nope".into());
        let err = AppError::from(dto.validate().unwrap_err());
        let AppError::InvalidFields(fields) = err else { panic!("expected field errors") };
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().any(|f| f.field == "name" && f.message == "Name must be at least 2 characters"));
        assert!(fields.iter().any(|f| f.field == "phone"));
        assert!(fields.iter().any(|f| f.field == "assigned_to"));
    }

    #[test]
    fn update_keeps_untouched_fields() {
        let mut dto = create_dto();
        dto.normalize();
        let mut client = dto.into_entity(USER);
        let mut patch: UpdateClientDto = serde_json::from_value(serde_json::json!({ "status": "inactive", "email": " NEW@x.com " })).unwrap();
        patch.normalize();
        assert!(patch.validate().is_ok());
        patch.apply(&mut client);
        assert_eq!(client.status, ClientStatus::Inactive);
        assert_eq!(client.email, "new@x.com");
        assert_eq!(client.name, "Asha Rao");
    }
}
