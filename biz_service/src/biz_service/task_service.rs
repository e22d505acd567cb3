use crate::biz_service::client_service::ClientService;
use crate::biz_service::property_service::PropertyService;
use crate::biz_service::ref_loader::RefIds;
use crate::entitys::task_entity::{TASK_COLLECTION, TaskEntity, TaskStatus, TaskView};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::date_util::now;
use mongodb::Database;
use mongodb::bson::{Document, doc};
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[derive(Debug)]
pub struct TaskService {
    pub dao: BaseRepository<TaskEntity>,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(TASK_COLLECTION);
        Self { dao: BaseRepository::new(collection) }
    }

    pub fn init(db: Database) {
        let instance = Self::new(db);
        INSTANCE.set(Arc::new(instance)).expect("INSTANCE already initialized");
    }

    /// 获取单例
    pub fn get() -> Arc<Self> {
        INSTANCE.get().expect("INSTANCE is not initialized").clone()
    }

    pub async fn find(&self, id: &str) -> Result<TaskEntity, AppError> {
        self.dao.find_one(doc! { "_id": id, "isActive": true }).await?.ok_or_else(|| AppError::not_found("Task"))
    }

    async fn check_refs(&self, task: &TaskEntity) -> Result<(), AppError> {
        if let Some(client_id) = &task.client {
            ClientService::get().find(client_id).await?;
        }
        if let Some(property_id) = &task.property {
            PropertyService::get().find(property_id).await?;
        }
        Ok(())
    }

    pub async fn create(&self, mut task: TaskEntity) -> Result<TaskEntity, AppError> {
        self.check_refs(&task).await?;
        task.stamp_completion(TaskStatus::Pending, task.created_at);
        self.dao.insert(&task).await?;
        Ok(task)
    }

    pub async fn update(&self, previous: TaskStatus, mut task: TaskEntity) -> Result<TaskEntity, AppError> {
        self.check_refs(&task).await?;
        let now = now();
        task.stamp_completion(previous, now);
        task.updated_at = now;
        if self.dao.save(&task.id, &task).await? == 0 {
            return Err(AppError::not_found("Task"));
        }
        Ok(task)
    }

    pub async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        self.find(id).await?;
        self.dao.update(doc! { "_id": id }, doc! { "$set": { "isActive": false, "updatedAt": now() } }).await?;
        Ok(())
    }

    pub async fn list(&self, filter: Document, page: &PageRequest) -> Result<PageResult<TaskView>, AppError> {
        let result = self.dao.query_page(filter, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn view(&self, id: &str) -> Result<TaskView, AppError> {
        let task = self.find(id).await?;
        self.to_view(task).await
    }

    pub async fn to_view(&self, task: TaskEntity) -> Result<TaskView, AppError> {
        let mut views = self.to_views(vec![task]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Task"))
    }

    pub async fn to_views(&self, tasks: Vec<TaskEntity>) -> Result<Vec<TaskView>, AppError> {
        let mut ids = RefIds::new();
        for t in &tasks {
            ids.client(t.client.as_ref()).property(t.property.as_ref()).user(t.assigned_to.as_ref());
        }
        let refs = ids.load().await?;
        Ok(tasks
            .into_iter()
            .map(|task| TaskView {
                client_info: refs.client(task.client.as_ref()),
                property_info: refs.property(task.property.as_ref()),
                assignee: refs.user(task.assigned_to.as_ref()),
                task,
            })
            .collect())
    }
}

static INSTANCE: OnceCell<Arc<TaskService>> = OnceCell::new();
