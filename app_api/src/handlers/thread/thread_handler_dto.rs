use biz_service::entitys::common_entity::Attachment;
use biz_service::entitys::thread_entity::{MessageEntity, ThreadEntity};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::OrderType;
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::query_util::empty_as_none;
use common::util::validate::{validate_object_id, validate_object_ids};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// 会话列表、消息列表共用的分页参数
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ThreadPageQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_order: Option<OrderType>,
}

impl ThreadPageQuery {
    /// 会话默认按最近更新倒序
    pub fn thread_page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, Some(self.sort_by.as_deref().unwrap_or("updatedAt")), self.sort_order)
    }

    /// 消息默认按发送时间正序
    pub fn message_page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), Some(self.sort_order.unwrap_or(OrderType::Asc)))
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "validate_object_ids"))]
    pub participants: Vec<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub property: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub client: Option<String>,
}

impl CreateThreadDto {
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.property = trim_to_option(self.property.take());
        self.client = trim_to_option(self.client.take());
        let mut participants: Vec<String> = Vec::with_capacity(self.participants.len());
        for p in self.participants.drain(..) {
            let p = p.trim().to_string();
            if !p.is_empty() && !participants.contains(&p) {
                participants.push(p);
            }
        }
        self.participants = participants;
    }

    pub fn into_entity(self) -> ThreadEntity {
        let now = now();
        ThreadEntity {
            id: build_id(),
            title: self.title,
            participants: self.participants,
            property: self.property,
            client: self.client,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageDto {
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<Attachment>,
}

impl PostMessageDto {
    pub fn normalize(&mut self) {
        self.content = self.content.trim().to_string();
    }

    /// 发送者取自 token，会话 id 取自路径
    pub fn into_entity(self, thread_id: &str, sender: &str) -> MessageEntity {
        let now = now();
        MessageEntity {
            id: build_id(),
            content: self.content,
            sender: sender.to_string(),
            thread: thread_id.to_string(),
            is_read: false,
            attachments: self.attachments.into_iter().map(|a| a.normalize(now)).collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;
    use mongodb::bson::doc;
    use serde_json::json;

    const USER: &str = "507f1f77bcf86cd799439099";
    const OTHER: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn messages_default_oldest_first() {
        let q = Query::<ThreadPageQuery>::from_query("page=2").unwrap();
        let page = q.message_page().unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.sort_doc(), doc! { "createdAt": 1, "_id": 1 });

        let page = q.thread_page().unwrap();
        assert_eq!(page.sort_doc(), doc! { "updatedAt": -1, "_id": -1 });
    }

    #[test]
    fn participants_are_deduplicated() {
        let mut dto: CreateThreadDto =
            serde_json::from_value(json!({ "title": " Deal room ", "participants": [OTHER, OTHER, " "] })).unwrap();
        dto.normalize();
        assert!(dto.validate().is_ok());
        let thread = dto.into_entity();
        assert_eq!(thread.title, "Deal room");
        assert_eq!(thread.participants, vec![OTHER]);
        assert!(thread.is_active);
    }

    #[test]
    fn invalid_participant_is_rejected() {
        let dto: CreateThreadDto = serde_json::from_value(json!({ "title": "x", "participants": ["nope"] })).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn message_takes_sender_from_caller() {
        let mut dto: PostMessageDto = serde_json::from_value(json!({ "content": "  hello  ", "sender": OTHER })).unwrap();
        dto.normalize();
        assert!(dto.validate().is_ok());
        let message = dto.into_entity(OTHER, USER);
        assert_eq!(message.content, "hello");
        assert_eq!(message.sender, USER);
        assert_eq!(message.thread, OTHER);
        assert!(!message.is_read);
    }

    #[test]
    fn empty_message_is_rejected() {
        let mut dto: PostMessageDto = serde_json::from_value(json!({ "content": "   " })).unwrap();
        dto.normalize();
        assert!(dto.validate().is_err());
    }
}
