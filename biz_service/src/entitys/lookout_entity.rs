use crate::entitys::client_entity::ClientBrief;
use crate::entitys::common_entity::{AreaRange, BudgetRange, Priority, PropertyType};
use crate::entitys::user_entity::UserBrief;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub const LOOKOUT_COLLECTION: &str = "lookouts";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LookoutStatus {
    #[default]
    Active,
    OnHold,
    Completed,
    Cancelled,
}

/// 买方找房需求单
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["clientId"])]
#[mongo_index(fields["status"])]
#[mongo_index(fields["priority"])]
#[mongo_index(fields["assignedTo"])]
#[mongo_index(fields["createdAt"], order = "desc")]
pub struct LookoutEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub budget: BudgetRange,
    #[serde(default)]
    pub area: AreaRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: LookoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookoutView {
    #[serde(flatten)]
    pub lookout: LookoutEntity,
    pub budget_display: String,
    pub area_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserBrief>,
}

impl LookoutView {
    pub fn new(lookout: LookoutEntity, client: Option<ClientBrief>, assignee: Option<UserBrief>) -> Self {
        Self { budget_display: lookout.budget.display(), area_display: lookout.area.display(), lookout, client, assignee }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_carries_display_strings() {
        let lookout = LookoutEntity {
            title: "3BHK near metro".into(),
            budget: BudgetRange { min: Some(8_000_000.0), ..Default::default() },
            area: AreaRange { min: Some(900.0), max: Some(1400.0), ..Default::default() },
            ..Default::default()
        };
        let json = serde_json::to_value(LookoutView::new(lookout, None, None)).unwrap();
        assert_eq!(json["budgetDisplay"], "₹80,00,000+");
        assert_eq!(json["areaDisplay"], "900 - 1,400 sq ft");
        assert_eq!(json["status"], "active");
        assert_eq!(json["priority"], "medium");
    }

    #[test]
    fn on_hold_status_is_kebab_case() {
        assert_eq!(serde_json::to_value(LookoutStatus::OnHold).unwrap(), "on-hold");
    }
}
