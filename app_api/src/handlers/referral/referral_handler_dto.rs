use biz_service::entitys::common_entity::CommissionType;
use biz_service::entitys::referral_entity::{CommissionStatus, ReferralCommission, ReferralEntity, ReferralStatus, ReferredType};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::OrderType;
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::query_util::empty_as_none;
use common::util::validate::validate_object_id;
use mongo_macro::QueryFilter;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams, QueryFilter)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReferralListQuery {
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
    pub status: Option<ReferralStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "commissionStatus")]
    pub commission_status: Option<CommissionStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "referredByClientId")]
    pub referred_by_client_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "referredType")]
    pub referred_type: Option<ReferredType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "assignedTo")]
    pub assigned_to: Option<String>,
    /// 按推荐人姓名 / 邮箱 / 电话搜索
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
}

impl ReferralListQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), self.sort_order)
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReferralDto {
    #[validate(custom(function = "validate_object_id"))]
    pub referred_by_client_id: String,
    pub referred_type: ReferredType,
    #[validate(custom(function = "validate_object_id"))]
    pub referred_client_id: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub referred_property_id: Option<String>,
    pub deal_id: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub commission: ReferralCommission,
    #[serde(default)]
    pub commission_status: CommissionStatus,
    #[serde(default)]
    pub status: ReferralStatus,
    #[validate(custom(function = "validate_object_id"))]
    pub parent_referral_id: Option<String>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl CreateReferralDto {
    pub fn normalize(&mut self) {
        self.referred_client_id = trim_to_option(self.referred_client_id.take());
        self.referred_property_id = trim_to_option(self.referred_property_id.take());
        self.deal_id = trim_to_option(self.deal_id.take());
        self.parent_referral_id = trim_to_option(self.parent_referral_id.take());
        self.notes = trim_to_option(self.notes.take());
        self.assigned_to = trim_to_option(self.assigned_to.take());
    }

    /// chainLevel 与已付金额由 ReferralService 填写
    pub fn into_entity(self, caller: &str) -> ReferralEntity {
        let now = now();
        ReferralEntity {
            id: build_id(),
            referred_by_client_id: self.referred_by_client_id,
            referred_type: self.referred_type,
            referred_client_id: self.referred_client_id,
            referred_property_id: self.referred_property_id,
            deal_id: self.deal_id,
            commission: self.commission,
            commission_status: self.commission_status,
            status: self.status,
            parent_referral_id: self.parent_referral_id,
            chain_level: 1,
            notes: self.notes,
            assigned_to: self.assigned_to.or_else(|| Some(caller.to_string())),
            converted_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 佣金合并更新
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCommissionPatch {
    #[serde(rename = "type")]
    pub commission_type: Option<CommissionType>,
    #[validate(range(min = 0.0, message = "Commission value cannot be negative"))]
    pub value: Option<f64>,
    pub currency: Option<String>,
    #[validate(range(min = 0.0, message = "Promised commission cannot be negative"))]
    pub promised: Option<f64>,
    #[validate(range(min = 0.0, message = "Paid commission cannot be negative"))]
    pub paid: Option<f64>,
}

impl ReferralCommissionPatch {
    pub fn apply(self, commission: &mut ReferralCommission) {
        if let Some(commission_type) = self.commission_type {
            commission.commission_type = commission_type;
        }
        if let Some(value) = self.value {
            commission.value = value;
        }
        if let Some(currency) = trim_to_option(self.currency) {
            commission.currency = currency;
        }
        if let Some(promised) = self.promised {
            commission.promised = promised;
        }
        if let Some(paid) = self.paid {
            commission.paid = paid;
        }
    }
}

/// 推荐人与被推荐对象不可修改
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReferralDto {
    pub deal_id: Option<String>,
    #[validate(nested)]
    pub commission: Option<ReferralCommissionPatch>,
    pub commission_status: Option<CommissionStatus>,
    pub status: Option<ReferralStatus>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl UpdateReferralDto {
    pub fn apply(self, referral: &mut ReferralEntity) {
        if let Some(deal_id) = self.deal_id {
            referral.deal_id = trim_to_option(Some(deal_id));
        }
        if let Some(patch) = self.commission {
            patch.apply(&mut referral.commission);
        }
        if let Some(commission_status) = self.commission_status {
            referral.commission_status = commission_status;
        }
        if let Some(status) = self.status {
            referral.status = status;
        }
        if let Some(notes) = self.notes {
            referral.notes = trim_to_option(Some(notes));
        }
        if let Some(assigned_to) = self.assigned_to {
            referral.assigned_to = trim_to_option(Some(assigned_to));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;
    use serde_json::json;

    const REFERRER: &str = "507f1f77bcf86cd799439011";
    const REFERRED: &str = "507f1f77bcf86cd799439022";
    const USER: &str = "507f1f77bcf86cd799439099";

    fn referral() -> ReferralEntity {
        let mut dto: CreateReferralDto = serde_json::from_value(json!({
            "referredByClientId": REFERRER,
            "referredType": "client",
            "referredClientId": REFERRED,
            "commission": { "type": "fixed", "value": 50000.0, "promised": 50000.0 },
        }))
        .unwrap();
        dto.normalize();
        assert!(dto.validate().is_ok());
        dto.into_entity(USER)
    }

    #[test]
    fn list_query_filter() {
        let q = Query::<ReferralListQuery>::from_query("status=converted&commissionStatus=partial&referredType=property").unwrap();
        let filter = q.to_query_doc();
        assert_eq!(filter.get_str("status").unwrap(), "converted");
        assert_eq!(filter.get_str("commissionStatus").unwrap(), "partial");
        assert_eq!(filter.get_str("referredType").unwrap(), "property");
    }

    #[test]
    fn create_defaults() {
        let r = referral();
        assert_eq!(r.status, ReferralStatus::Active);
        assert_eq!(r.commission_status, CommissionStatus::Pending);
        assert_eq!(r.commission.currency, "INR");
        assert_eq!(r.chain_level, 1);
        assert!(r.check_target().is_ok());
    }

    #[test]
    fn update_merges_commission_and_keeps_target() {
        let mut r = referral();
        let patch: UpdateReferralDto = serde_json::from_value(json!({
            "status": "converted",
            "commission": { "paid": 20000.0 },
            "referredClientId": "507f1f77bcf86cd799439033",
        }))
        .unwrap();
        assert!(patch.validate().is_ok());
        patch.apply(&mut r);
        assert_eq!(r.status, ReferralStatus::Converted);
        assert_eq!(r.commission.promised, 50000.0);
        assert_eq!(r.commission.paid, 20000.0);
        assert_eq!(r.referred_client_id.as_deref(), Some(REFERRED));
        assert_eq!(r.remaining_commission(), 30000.0);
    }

    #[test]
    fn negative_paid_is_rejected() {
        let patch: UpdateReferralDto = serde_json::from_value(json!({ "commission": { "paid": -1.0 } })).unwrap();
        assert!(patch.validate().is_err());
    }

    #[test]
    fn create_with_final_status_gets_timestamps() {
        let dto: CreateReferralDto = serde_json::from_value(json!({
            "referredByClientId": REFERRER,
            "referredType": "client",
            "referredClientId": REFERRED,
            "status": "converted",
            "commissionStatus": "paid",
        }))
        .unwrap();
        let mut r = dto.into_entity(USER);
        r.stamp_created();
        assert_eq!(r.status, ReferralStatus::Converted);
        assert_eq!(r.converted_at, Some(r.created_at));
        assert_eq!(r.paid_at, Some(r.created_at));
    }
}
