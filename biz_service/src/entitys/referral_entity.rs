use crate::entitys::client_entity::ClientBrief;
use crate::entitys::common_entity::{CommissionType, DEFAULT_CURRENCY, commission_text};
use crate::entitys::property_entity::PropertyBrief;
use crate::entitys::user_entity::UserBrief;
use common::errors::AppError;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

pub const REFERRAL_COLLECTION: &str = "referrals";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReferredType {
    #[default]
    Client,
    Property,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReferralStatus {
    #[default]
    Active,
    Converted,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CommissionStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Cancelled,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// 推荐佣金：约定值、承诺金额与已付金额
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCommission {
    #[serde(rename = "type", default)]
    pub commission_type: CommissionType,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Commission value cannot be negative"))]
    pub value: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Promised commission cannot be negative"))]
    pub promised: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Paid commission cannot be negative"))]
    pub paid: f64,
}

impl Default for ReferralCommission {
    fn default() -> Self {
        Self { commission_type: CommissionType::Fixed, value: 0.0, currency: default_currency(), promised: 0.0, paid: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["referredByClientId"])]
#[mongo_index(fields["referredClientId"])]
#[mongo_index(fields["referredPropertyId"])]
#[mongo_index(fields["dealId"])]
#[mongo_index(fields["status"])]
#[mongo_index(fields["commissionStatus"])]
#[mongo_index(fields["assignedTo"])]
#[mongo_index(fields["parentReferralId"])]
#[mongo_index(fields["createdAt"], order = "desc")]
pub struct ReferralEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub referred_by_client_id: String,
    pub referred_type: ReferredType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    #[serde(default)]
    pub commission: ReferralCommission,
    #[serde(default)]
    pub commission_status: CommissionStatus,
    #[serde(default)]
    pub status: ReferralStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_referral_id: Option<String>,
    /// 1 为直接推荐，链式推荐为上级 + 1
    #[serde(default = "default_chain_level")]
    pub chain_level: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_chain_level() -> i32 {
    1
}

impl ReferralEntity {
    /// 被推荐对象必须且只能有一个，并与 `referredType` 一致
    pub fn check_target(&self) -> Result<(), AppError> {
        match (&self.referred_client_id, &self.referred_property_id) {
            (None, None) => Err(AppError::Validation("Either referredClientId or referredPropertyId must be provided".into())),
            (Some(_), Some(_)) => Err(AppError::Validation("Cannot refer both client and property simultaneously".into())),
            (Some(_), None) if self.referred_type != ReferredType::Client => {
                Err(AppError::Validation("Referred property ID is required".into()))
            }
            (None, Some(_)) if self.referred_type != ReferredType::Property => {
                Err(AppError::Validation("Referred client ID is required".into()))
            }
            _ => Ok(()),
        }
    }

    /// 状态首次变为 converted / paid 时记录时间
    pub fn stamp_transitions(&mut self, previous_status: ReferralStatus, previous_commission_status: CommissionStatus, now: i64) {
        if self.status == ReferralStatus::Converted && previous_status != ReferralStatus::Converted {
            self.converted_at = Some(now);
        }
        if self.commission_status == CommissionStatus::Paid && previous_commission_status != CommissionStatus::Paid {
            self.paid_at = Some(now);
        }
    }

    /// 新建记录按 active / pending 的初始状态计算时间戳
    pub fn stamp_created(&mut self) {
        self.stamp_transitions(ReferralStatus::Active, CommissionStatus::Pending, self.created_at);
    }

    pub fn commission_display(&self) -> String {
        commission_text(self.commission.commission_type, self.commission.value)
    }

    pub fn remaining_commission(&self) -> f64 {
        self.commission.promised - self.commission.paid
    }

    /// promised 为 0 时返回 0
    pub fn commission_percentage_paid(&self) -> f64 {
        if self.commission.promised == 0.0 {
            return 0.0;
        }
        self.commission.paid / self.commission.promised * 100.0
    }
}

/// 链式推荐的层级
pub fn chain_level(parent: Option<&ReferralEntity>) -> i32 {
    parent.map(|p| p.chain_level + 1).unwrap_or(1)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralView {
    #[serde(flatten)]
    pub referral: ReferralEntity,
    pub commission_display: String,
    pub remaining_commission: f64,
    pub commission_percentage_paid: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_client: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_property: Option<PropertyBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referral(client: Option<&str>, property: Option<&str>, referred_type: ReferredType) -> ReferralEntity {
        ReferralEntity {
            referred_type,
            referred_client_id: client.map(String::from),
            referred_property_id: property.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn exactly_one_target_is_required() {
        assert!(referral(None, None, ReferredType::Client).check_target().is_err());
        assert!(referral(Some("c"), Some("p"), ReferredType::Client).check_target().is_err());
        assert!(referral(Some("c"), None, ReferredType::Client).check_target().is_ok());
        assert!(referral(None, Some("p"), ReferredType::Property).check_target().is_ok());
    }

    #[test]
    fn target_must_match_type() {
        assert!(referral(Some("c"), None, ReferredType::Property).check_target().is_err());
        assert!(referral(None, Some("p"), ReferredType::Client).check_target().is_err());
    }

    #[test]
    fn chain_level_follows_parent() {
        assert_eq!(chain_level(None), 1);
        let parent = ReferralEntity { chain_level: 2, ..Default::default() };
        assert_eq!(chain_level(Some(&parent)), 3);
    }

    #[test]
    fn commission_math() {
        let mut r = ReferralEntity::default();
        assert_eq!(r.commission_percentage_paid(), 0.0);
        r.commission.promised = 200000.0;
        r.commission.paid = 50000.0;
        assert_eq!(r.remaining_commission(), 150000.0);
        assert_eq!(r.commission_percentage_paid(), 25.0);
        r.commission.value = 1.5;
        r.commission.commission_type = CommissionType::Percentage;
        assert_eq!(r.commission_display(), "1.5%");
    }

    #[test]
    fn transitions_are_stamped_once() {
        let mut r = ReferralEntity { status: ReferralStatus::Converted, commission_status: CommissionStatus::Paid, ..Default::default() };
        r.stamp_transitions(ReferralStatus::Active, CommissionStatus::Partial, 100);
        assert_eq!(r.converted_at, Some(100));
        assert_eq!(r.paid_at, Some(100));

        r.stamp_transitions(ReferralStatus::Converted, CommissionStatus::Paid, 200);
        assert_eq!(r.converted_at, Some(100));
        assert_eq!(r.paid_at, Some(100));
    }

    #[test]
    fn created_as_converted_and_paid_is_stamped() {
        let mut r = ReferralEntity {
            status: ReferralStatus::Converted,
            commission_status: CommissionStatus::Paid,
            created_at: 500,
            ..Default::default()
        };
        r.stamp_created();
        assert_eq!(r.converted_at, Some(500));
        assert_eq!(r.paid_at, Some(500));

        let mut fresh = ReferralEntity { created_at: 500, ..Default::default() };
        fresh.stamp_created();
        assert_eq!(fresh.converted_at, None);
        assert_eq!(fresh.paid_at, None);
    }
}
