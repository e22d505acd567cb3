use biz_service::entitys::common_entity::{AreaRange, BudgetRange, Priority, PropertyType};
use biz_service::entitys::lookout_entity::{LookoutEntity, LookoutStatus};
use common::errors::AppError;
use common::query_builder::{PageRequest, QueryBuilder};
use common::repository_util::OrderType;
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::query_util::empty_as_none;
use common::util::validate::validate_object_id;
use mongo_macro::QueryFilter;
use mongodb::bson::Document;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams, QueryFilter)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LookoutListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_order: Option<OrderType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "clientId")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "status")]
    pub status: Option<LookoutStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "priority")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "assignedTo")]
    pub assigned_to: Option<String>,
    /// 标题、需求或客户信息搜索
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
}

impl LookoutListQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), self.sort_order)
    }
}

/// `$or`: 标题 / 需求包含关键字，或属于匹配到的客户
pub fn search_clause(search: &str, client_ids: Vec<String>) -> Document {
    QueryBuilder::new()
        .like("title", search)
        .or()
        .like("requirements", search)
        .or()
        .in_array("clientId", client_ids)
        .build()
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLookoutDto {
    #[validate(custom(function = "validate_object_id"))]
    pub client_id: String,
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub budget: BudgetRange,
    #[serde(default)]
    #[validate(nested)]
    pub area: AreaRange,
    #[validate(length(max = 2000, message = "Requirements cannot exceed 2000 characters"))]
    pub requirements: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: LookoutStatus,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

fn normalize_cities(cities: Vec<String>) -> Vec<String> {
    cities.into_iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect()
}

impl CreateLookoutDto {
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.cities = normalize_cities(std::mem::take(&mut self.cities));
        self.requirements = trim_to_option(self.requirements.take());
        self.assigned_to = trim_to_option(self.assigned_to.take());
    }

    pub fn into_entity(self, caller: &str) -> LookoutEntity {
        let now = now();
        LookoutEntity {
            id: build_id(),
            client_id: self.client_id,
            title: self.title,
            property_types: self.property_types,
            cities: self.cities,
            budget: self.budget,
            area: self.area,
            requirements: self.requirements,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to.or_else(|| Some(caller.to_string())),
            created_at: now,
            updated_at: now,
        }
    }
}

/// clientId 不可修改
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLookoutDto {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: Option<String>,
    pub property_types: Option<Vec<PropertyType>>,
    pub cities: Option<Vec<String>>,
    #[validate(nested)]
    pub budget: Option<BudgetRange>,
    #[validate(nested)]
    pub area: Option<AreaRange>,
    #[validate(length(max = 2000, message = "Requirements cannot exceed 2000 characters"))]
    pub requirements: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<LookoutStatus>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl UpdateLookoutDto {
    pub fn normalize(&mut self) {
        self.title = self.title.take().map(|s| s.trim().to_string());
    }

    pub fn apply(self, lookout: &mut LookoutEntity) {
        if let Some(title) = self.title {
            lookout.title = title;
        }
        if let Some(types) = self.property_types {
            lookout.property_types = types;
        }
        if let Some(cities) = self.cities {
            lookout.cities = normalize_cities(cities);
        }
        if let Some(budget) = self.budget {
            lookout.budget = budget;
        }
        if let Some(area) = self.area {
            lookout.area = area;
        }
        if let Some(requirements) = self.requirements {
            lookout.requirements = trim_to_option(Some(requirements));
        }
        if let Some(priority) = self.priority {
            lookout.priority = priority;
        }
        if let Some(status) = self.status {
            lookout.status = status;
        }
        if let Some(assigned_to) = self.assigned_to {
            lookout.assigned_to = trim_to_option(Some(assigned_to));
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
        let q = Query::<LookoutListQuery>::from_query("status=on-hold&priority=urgent").unwrap();
        let filter = q.to_query_doc();
        assert_eq!(filter.get_str("status").unwrap(), "on-hold");
        assert_eq!(filter.get_str("priority").unwrap(), "urgent");
    }

    #[test]
    fn search_clause_escapes_input() {
        let clause = search_clause("2bhk (sea)", vec![CLIENT.into()]);
        let branches = clause.get_array("$or").unwrap();
        assert_eq!(branches.len(), 3);
        let title = branches[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), "2bhk \\(sea\\)");
        let clients = branches[2].as_document().unwrap().get_document("clientId").unwrap();
        assert_eq!(clients.get_array("$in").unwrap().len(), 1);
    }

    #[test]
    fn create_defaults() {
        let mut dto: CreateLookoutDto = serde_json::from_value(json!({
            "clientId": CLIENT,
            "title": " 3BHK near metro ",
            "propertyTypes": ["Apartment", "Commercial"],
            "cities": [" Pune", ""],
            "budget": { "min": 5000000.0, "max": 8000000.0 },
        }))
        .unwrap();
        dto.normalize();
        assert!(dto.validate().is_ok());
        let lookout = dto.into_entity(USER);
        assert_eq!(lookout.title, "3BHK near metro");
        assert_eq!(lookout.cities, vec!["Pune".to_string()]);
        assert_eq!(lookout.priority, Priority::Medium);
        assert_eq!(lookout.status, LookoutStatus::Active);
        assert_eq!(lookout.budget.currency, "INR");
        assert_eq!(lookout.area.unit, "sq ft");
    }

    #[test]
    fn inverted_budget_is_rejected() {
        let dto: CreateLookoutDto = serde_json::from_value(json!({
            "clientId": CLIENT,
            "title": "Office space",
            "budget": { "min": 9.0, "max": 1.0 },
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn update_ignores_client_id() {
        let dto: CreateLookoutDto = serde_json::from_value(json!({ "clientId": CLIENT, "title": "Villa hunt" })).unwrap();
        let mut lookout = dto.into_entity(USER);
        let patch: UpdateLookoutDto = serde_json::from_value(json!({ "clientId": USER, "status": "completed" })).unwrap();
        patch.apply(&mut lookout);
        assert_eq!(lookout.client_id, CLIENT);
        assert_eq!(lookout.status, LookoutStatus::Completed);
    }
}
