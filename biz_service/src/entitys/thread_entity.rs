use crate::entitys::client_entity::ClientBrief;
use crate::entitys::common_entity::Attachment;
use crate::entitys::property_entity::PropertyBrief;
use crate::entitys::user_entity::UserBrief;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const THREAD_COLLECTION: &str = "threads";
pub const MESSAGE_COLLECTION: &str = "messages";

/// 会话
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["participants", "isActive"])]
#[mongo_index(fields["updatedAt"], order = "desc")]
pub struct ThreadEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// 参与的用户 id
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ThreadEntity {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// 加入参与者，已存在则忽略
    pub fn add_participant(&mut self, user_id: &str) {
        if !self.has_participant(user_id) {
            self.participants.push(user_id.to_string());
        }
    }
}

/// 会话内的消息
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["thread", "createdAt"])]
#[mongo_index(fields["thread", "isRead"])]
pub struct MessageEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    /// 发送者用户 id
    pub sender: String,
    /// 所属会话 id
    pub thread: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    #[serde(flatten)]
    pub thread: ThreadEntity,
    pub participants_info: Vec<UserBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_info: Option<PropertyBrief>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: MessageEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_info: Option<UserBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participants_are_unique() {
        let mut thread = ThreadEntity::default();
        thread.add_participant("u1");
        thread.add_participant("u2");
        thread.add_participant("u1");
        assert_eq!(thread.participants, vec!["u1", "u2"]);
        assert!(thread.has_participant("u2"));
        assert!(!thread.has_participant("u3"));
    }
}
