use crate::entitys::client_entity::ClientBrief;
use crate::entitys::common_entity::Priority;
use crate::entitys::property_entity::PropertyBrief;
use crate::entitys::user_entity::UserBrief;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub const TASK_COLLECTION: &str = "tasks";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["assignedTo", "status"])]
#[mongo_index(fields["client"])]
#[mongo_index(fields["property"])]
#[mongo_index(fields["dueDate"])]
pub struct TaskEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// 关联物业 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// 关联客户 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskEntity {
    /// 进入 completed 时记录完成时间，离开时清除
    pub fn stamp_completion(&mut self, previous: TaskStatus, now: i64) {
        match (previous, self.status) {
            (prev, TaskStatus::Completed) if prev != TaskStatus::Completed => self.completed_at = Some(now),
            (_, status) if status != TaskStatus::Completed => self.completed_at = None,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: TaskEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_info: Option<PropertyBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_stamped_on_transition() {
        let mut task = TaskEntity { status: TaskStatus::Completed, ..Default::default() };
        task.stamp_completion(TaskStatus::InProgress, 10);
        assert_eq!(task.completed_at, Some(10));

        task.stamp_completion(TaskStatus::Completed, 20);
        assert_eq!(task.completed_at, Some(10));

        task.status = TaskStatus::Pending;
        task.stamp_completion(TaskStatus::Completed, 30);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn in_progress_is_kebab_case() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in-progress");
    }
}
