use biz_service::entitys::common_entity::Priority;
use biz_service::entitys::task_entity::{TaskEntity, TaskStatus};
use common::errors::AppError;
use common::query_builder::PageRequest;
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
pub struct TaskListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_order: Option<OrderType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "status")]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "priority")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "client")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "property")]
    pub property: Option<String>,
}

impl TaskListQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), self.sort_order)
    }

    pub fn filter(&self) -> Document {
        let mut filter = self.to_query_doc();
        filter.insert("isActive", true);
        filter
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub property: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub client: Option<String>,
    /// Unix 毫秒
    pub due_date: Option<i64>,
}

impl CreateTaskDto {
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.description = trim_to_option(self.description.take());
        self.assigned_to = trim_to_option(self.assigned_to.take());
        self.property = trim_to_option(self.property.take());
        self.client = trim_to_option(self.client.take());
    }

    pub fn into_entity(self, caller: &str) -> TaskEntity {
        let now = now();
        TaskEntity {
            id: build_id(),
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            assigned_to: self.assigned_to.or_else(|| Some(caller.to_string())),
            property: self.property,
            client: self.client,
            due_date: self.due_date,
            completed_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub property: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub client: Option<String>,
    pub due_date: Option<i64>,
}

impl UpdateTaskDto {
    pub fn normalize(&mut self) {
        self.title = self.title.take().map(|s| s.trim().to_string());
    }

    pub fn apply(self, task: &mut TaskEntity) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = trim_to_option(Some(description));
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = trim_to_option(Some(assigned_to));
        }
        if let Some(property) = self.property {
            task.property = trim_to_option(Some(property));
        }
        if let Some(client) = self.client {
            task.client = trim_to_option(Some(client));
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;
    use serde_json::json;

    const USER: &str = "507f1f77bcf86cd799439099";

    #[test]
    fn list_filter_excludes_deleted() {
        let q = Query::<TaskListQuery>::from_query("status=in-progress&priority=high").unwrap();
        let filter = q.filter();
        assert_eq!(filter.get_str("status").unwrap(), "in-progress");
        assert_eq!(filter.get_str("priority").unwrap(), "high");
        assert_eq!(filter.get_bool("isActive").unwrap(), true);
    }

    #[test]
    fn create_requires_title() {
        let mut dto: CreateTaskDto = serde_json::from_value(json!({ "title": "   " })).unwrap();
        dto.normalize();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn create_assigns_caller() {
        let mut dto: CreateTaskDto = serde_json::from_value(json!({ "title": "Site visit", "dueDate": 1735689600000i64 })).unwrap();
        dto.normalize();
        let task = dto.into_entity(USER);
        assert_eq!(task.assigned_to.as_deref(), Some(USER));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.due_date, Some(1735689600000));
        assert!(task.is_active);
    }

    #[test]
    fn update_applies_status() {
        let dto: CreateTaskDto = serde_json::from_value(json!({ "title": "Call owner" })).unwrap();
        let mut task = dto.into_entity(USER);
        let patch: UpdateTaskDto = serde_json::from_value(json!({ "status": "completed" })).unwrap();
        patch.apply(&mut task);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.title, "Call owner");
    }
}
