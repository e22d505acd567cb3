use crate::biz_service::client_service::ClientService;
use crate::biz_service::ref_loader::RefIds;
use crate::biz_service::stats::{GroupCount, count_if, group_counts, overview};
use crate::entitys::lookout_entity::{LOOKOUT_COLLECTION, LookoutEntity, LookoutView};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::date_util::now;
use mongodb::Database;
use mongodb::bson::{Document, doc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookoutOverview {
    pub total_lookouts: i64,
    pub active_lookouts: i64,
    pub on_hold_lookouts: i64,
    pub completed_lookouts: i64,
    pub urgent_lookouts: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookoutStats {
    pub overview: LookoutOverview,
    pub by_priority: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
}

#[derive(Debug)]
pub struct LookoutService {
    pub dao: BaseRepository<LookoutEntity>,
}

impl LookoutService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(LOOKOUT_COLLECTION);
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

    pub async fn find(&self, id: &str) -> Result<LookoutEntity, AppError> {
        self.dao.find_by_id(id).await?.ok_or_else(|| AppError::not_found("Lookout"))
    }

    pub async fn create(&self, lookout: LookoutEntity) -> Result<LookoutEntity, AppError> {
        ClientService::get().find(&lookout.client_id).await?;
        self.dao.insert(&lookout).await?;
        Ok(lookout)
    }

    pub async fn update(&self, mut lookout: LookoutEntity) -> Result<LookoutEntity, AppError> {
        lookout.updated_at = now();
        if self.dao.save(&lookout.id, &lookout).await? == 0 {
            return Err(AppError::not_found("Lookout"));
        }
        Ok(lookout)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.dao.delete_by_id(id).await? == 0 {
            return Err(AppError::not_found("Lookout"));
        }
        Ok(())
    }

    pub async fn list(&self, filter: Document, page: &PageRequest) -> Result<PageResult<LookoutView>, AppError> {
        let result = self.dao.query_page(filter, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn list_for_client(&self, client_id: &str) -> Result<Vec<LookoutView>, AppError> {
        let lookouts = self.dao.find_many(doc! { "clientId": client_id }, Some(doc! { "createdAt": -1 })).await?;
        self.to_views(lookouts).await
    }

    pub async fn view(&self, id: &str) -> Result<LookoutView, AppError> {
        let lookout = self.find(id).await?;
        self.to_view(lookout).await
    }

    pub async fn to_view(&self, lookout: LookoutEntity) -> Result<LookoutView, AppError> {
        let mut views = self.to_views(vec![lookout]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Lookout"))
    }

    pub async fn to_views(&self, lookouts: Vec<LookoutEntity>) -> Result<Vec<LookoutView>, AppError> {
        let mut ids = RefIds::new();
        for l in &lookouts {
            ids.client(Some(&l.client_id)).user(l.assigned_to.as_ref());
        }
        let refs = ids.load().await?;
        Ok(lookouts
            .into_iter()
            .map(|l| {
                let client = refs.client(Some(&l.client_id));
                let assignee = refs.user(l.assigned_to.as_ref());
                LookoutView::new(l, client, assignee)
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<LookoutStats, AppError> {
        let accumulators = doc! {
            "totalLookouts": { "$sum": 1 },
            "activeLookouts": count_if("status", "active"),
            "onHoldLookouts": count_if("status", "on-hold"),
            "completedLookouts": count_if("status", "completed"),
            "urgentLookouts": count_if("priority", "urgent"),
        };
        Ok(LookoutStats {
            overview: overview(&self.dao, doc! {}, accumulators).await?,
            by_priority: group_counts(&self.dao, doc! {}, "priority").await?,
            by_status: group_counts(&self.dao, doc! {}, "status").await?,
        })
    }
}

static INSTANCE: OnceCell<Arc<LookoutService>> = OnceCell::new();
