use crate::biz_service::client_service::ClientService;
use crate::biz_service::property_service::PropertyService;
use crate::biz_service::ref_loader::RefIds;
use crate::biz_service::stats::{GroupCount, count_if, group_counts, overview};
use crate::entitys::referral_entity::{REFERRAL_COLLECTION, ReferralEntity, ReferralView, ReferredType, chain_level};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::{BaseRepository, PageResult, Repository};
use common::util::date_util::now;
use log::info;
use mongodb::Database;
use mongodb::bson::{Document, doc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralOverview {
    pub total_referrals: i64,
    pub active_referrals: i64,
    pub converted_referrals: i64,
    pub total_commission_promised: f64,
    pub total_commission_paid: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStats {
    pub overview: ReferralOverview,
    pub by_status: Vec<GroupCount>,
    pub by_commission_status: Vec<GroupCount>,
    pub by_type: Vec<GroupCount>,
}

#[derive(Debug)]
pub struct ReferralService {
    pub dao: BaseRepository<ReferralEntity>,
}

impl ReferralService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(REFERRAL_COLLECTION);
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

    pub async fn find(&self, id: &str) -> Result<ReferralEntity, AppError> {
        self.dao.find_by_id(id).await?.ok_or_else(|| AppError::not_found("Referral"))
    }

    /// 校验推荐人、被推荐对象与上级推荐，计算链路层级；已付佣金从 0 开始
    /// 以 converted / paid 状态新建时同样记录时间
    pub async fn create(&self, mut referral: ReferralEntity) -> Result<ReferralEntity, AppError> {
        referral.check_target()?;
        let clients = ClientService::get();
        clients.dao.find_by_id(&referral.referred_by_client_id).await?.ok_or_else(|| AppError::not_found("Referrer client"))?;
        match referral.referred_type {
            ReferredType::Client => {
                let id = referral.referred_client_id.as_deref().unwrap_or_default();
                clients.dao.find_by_id(id).await?.ok_or_else(|| AppError::not_found("Referred client"))?;
            }
            ReferredType::Property => {
                let id = referral.referred_property_id.as_deref().unwrap_or_default();
                PropertyService::get().find(id).await?;
            }
        }
        let parent = match &referral.parent_referral_id {
            Some(parent_id) => Some(self.dao.find_by_id(parent_id).await?.ok_or_else(|| AppError::not_found("Parent referral"))?),
            None => None,
        };
        referral.chain_level = chain_level(parent.as_ref());
        referral.commission.paid = 0.0;
        referral.stamp_created();
        self.dao.insert(&referral).await?;
        info!("referral created: {} level {}", referral.id, referral.chain_level);
        Ok(referral)
    }

    /// `previous` 为修改前的记录，用来判断状态变化
    pub async fn update(&self, previous: &ReferralEntity, mut referral: ReferralEntity) -> Result<ReferralEntity, AppError> {
        let now = now();
        referral.stamp_transitions(previous.status, previous.commission_status, now);
        referral.updated_at = now;
        if self.dao.save(&referral.id, &referral).await? == 0 {
            return Err(AppError::not_found("Referral"));
        }
        Ok(referral)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.dao.delete_by_id(id).await? == 0 {
            return Err(AppError::not_found("Referral"));
        }
        Ok(())
    }

    /// 客户作为推荐人或被推荐人的全部推荐
    pub async fn list_for_client(&self, client_id: &str) -> Result<Vec<ReferralView>, AppError> {
        let filter = doc! { "$or": [ { "referredByClientId": client_id }, { "referredClientId": client_id } ] };
        let referrals = self.dao.find_many(filter, Some(doc! { "createdAt": -1 })).await?;
        self.to_views(referrals).await
    }

    pub async fn list(&self, filter: Document, page: &PageRequest) -> Result<PageResult<ReferralView>, AppError> {
        let result = self.dao.query_page(filter, page).await?;
        let views = self.to_views(result.items).await?;
        Ok(PageResult { items: views, pagination: result.pagination })
    }

    pub async fn view(&self, id: &str) -> Result<ReferralView, AppError> {
        let referral = self.find(id).await?;
        self.to_view(referral).await
    }

    pub async fn to_view(&self, referral: ReferralEntity) -> Result<ReferralView, AppError> {
        let mut views = self.to_views(vec![referral]).await?;
        views.pop().ok_or_else(|| AppError::not_found("Referral"))
    }

    pub async fn to_views(&self, referrals: Vec<ReferralEntity>) -> Result<Vec<ReferralView>, AppError> {
        let mut ids = RefIds::new();
        for r in &referrals {
            ids.client(Some(&r.referred_by_client_id))
                .client(r.referred_client_id.as_ref())
                .property(r.referred_property_id.as_ref())
                .user(r.assigned_to.as_ref());
        }
        let refs = ids.load().await?;
        Ok(referrals
            .into_iter()
            .map(|referral| ReferralView {
                commission_display: referral.commission_display(),
                remaining_commission: referral.remaining_commission(),
                commission_percentage_paid: referral.commission_percentage_paid(),
                referred_by: refs.client(Some(&referral.referred_by_client_id)),
                referred_client: refs.client(referral.referred_client_id.as_ref()),
                referred_property: refs.property(referral.referred_property_id.as_ref()),
                assignee: refs.user(referral.assigned_to.as_ref()),
                referral,
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<ReferralStats, AppError> {
        let accumulators = doc! {
            "totalReferrals": { "$sum": 1 },
            "activeReferrals": count_if("status", "active"),
            "convertedReferrals": count_if("status", "converted"),
            "totalCommissionPromised": { "$sum": "$commission.promised" },
            "totalCommissionPaid": { "$sum": "$commission.paid" },
        };
        Ok(ReferralStats {
            overview: overview(&self.dao, doc! {}, accumulators).await?,
            by_status: group_counts(&self.dao, doc! {}, "status").await?,
            by_commission_status: group_counts(&self.dao, doc! {}, "commissionStatus").await?,
            by_type: group_counts(&self.dao, doc! {}, "referredType").await?,
        })
    }
}

static INSTANCE: OnceCell<Arc<ReferralService>> = OnceCell::new();
