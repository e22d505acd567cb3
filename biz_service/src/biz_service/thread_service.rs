use crate::biz_service::client_service::ClientService;
use crate::biz_service::property_service::PropertyService;
use crate::biz_service::ref_loader::RefIds;
use crate::biz_service::user_service::UserService;
use crate::entitys::thread_entity::{MESSAGE_COLLECTION, MessageEntity, MessageView, THREAD_COLLECTION, ThreadEntity, ThreadView};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::date_util::now;
use log::info;
use mongodb::Database;
use mongodb::bson::doc;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 会话与消息；只有参与者能看到会话
#[derive(Debug)]
pub struct ThreadService {
    pub dao: BaseRepository<ThreadEntity>,
    pub message_dao: BaseRepository<MessageEntity>,
}

impl ThreadService {
    pub fn new(db: Database) -> Self {
        Self {
            dao: BaseRepository::new(db.collection(THREAD_COLLECTION)),
            message_dao: BaseRepository::new(db.collection(MESSAGE_COLLECTION)),
        }
    }

    pub fn init(db: Database) {
        let instance = Self::new(db);
        INSTANCE.set(Arc::new(instance)).expect("INSTANCE already initialized");
    }

    /// 获取单例
    pub fn get() -> Arc<Self> {
        INSTANCE.get().expect("INSTANCE is not initialized").clone()
    }

    /// 不存在、已删除或当前用户不在会话中都按 404 处理
    pub async fn find_for(&self, id: &str, user_id: &str) -> Result<ThreadEntity, AppError> {
        self.dao
            .find_one(doc! { "_id": id, "isActive": true, "participants": user_id })
            .await?
            .ok_or_else(|| AppError::not_found("Thread"))
    }

    pub async fn create(&self, mut thread: ThreadEntity, creator: &str) -> Result<ThreadEntity, AppError> {
        thread.add_participant(creator);
        let users = UserService::get().dao.find_by_ids(&thread.participants).await?;
        if users.len() != thread.participants.len() {
            return Err(AppError::Validation("One or more participants do not exist".into()));
        }
        if let Some(client_id) = &thread.client {
            ClientService::get().find(client_id).await?;
        }
        if let Some(property_id) = &thread.property {
            PropertyService::get().find(property_id).await?;
        }
        self.dao.insert(&thread).await?;
        info!("thread created: {} ({} participants)", thread.id, thread.participants.len());
        Ok(thread)
    }

    pub async fn soft_delete(&self, id: &str, user_id: &str) -> Result<(), AppError> {
        self.find_for(id, user_id).await?;
        self.dao.update(doc! { "_id": id }, doc! { "$set": { "isActive": false, "updatedAt": now() } }).await?;
        Ok(())
    }

    pub async fn list_for(&self, user_id: &str, page: &PageRequest) -> Result<PageResult<ThreadView>, AppError> {
        let result = self.dao.query_page(doc! { "participants": user_id, "isActive": true }, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn view_for(&self, id: &str, user_id: &str) -> Result<ThreadView, AppError> {
        let thread = self.find_for(id, user_id).await?;
        let mut views = self.to_views(vec![thread]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Thread"))
    }

    pub async fn to_views(&self, threads: Vec<ThreadEntity>) -> Result<Vec<ThreadView>, AppError> {
        let mut ids = RefIds::new();
        for t in &threads {
            ids.users(&t.participants).client(t.client.as_ref()).property(t.property.as_ref());
        }
        let refs = ids.load().await?;
        Ok(threads
            .into_iter()
            .map(|thread| ThreadView {
                participants_info: thread.participants.iter().filter_map(|p| refs.user(Some(p))).collect(),
                client_info: refs.client(thread.client.as_ref()),
                property_info: refs.property(thread.property.as_ref()),
                thread,
            })
            .collect())
    }

    /// 消息按时间正序分页
    pub async fn messages(&self, thread_id: &str, user_id: &str, page: &PageRequest) -> Result<PageResult<MessageView>, AppError> {
        self.find_for(thread_id, user_id).await?;
        let result = self.message_dao.query_page(doc! { "thread": thread_id }, page).await?;
        let views = self.to_message_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn post_message(&self, message: MessageEntity) -> Result<MessageView, AppError> {
        self.find_for(&message.thread, &message.sender).await?;
        self.message_dao.insert(&message).await?;
        self.dao.up_property(&message.thread, "updatedAt", message.created_at.into()).await?;
        let mut views = self.to_message_views(vec![message]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Message"))
    }

    /// 把会话中他人发送的未读消息标记为已读，返回更新条数
    pub async fn mark_read(&self, thread_id: &str, user_id: &str) -> Result<u64, AppError> {
        self.find_for(thread_id, user_id).await?;
        let filter = doc! { "thread": thread_id, "sender": { "$ne": user_id }, "isRead": false };
        Ok(self.message_dao.update(filter, doc! { "$set": { "isRead": true, "updatedAt": now() } }).await?)
    }

    async fn to_message_views(&self, messages: Vec<MessageEntity>) -> Result<Vec<MessageView>, AppError> {
        let mut ids = RefIds::new();
        for m in &messages {
            ids.user(Some(&m.sender));
        }
        let refs = ids.load().await?;
        Ok(messages
            .into_iter()
            .map(|message| MessageView { sender_info: refs.user(Some(&message.sender)), message })
            .collect())
    }
}

static INSTANCE: OnceCell<Arc<ThreadService>> = OnceCell::new();
