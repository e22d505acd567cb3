use crate::entitys::client_entity::ClientBrief;
use crate::entitys::common_entity::{Attachment, PropertyType};
use crate::entitys::user_entity::UserBrief;
use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub const PROPERTY_COLLECTION: &str = "properties";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
pub enum Zoning {
    #[default]
    Residential,
    Commercial,
    Industrial,
    #[serde(rename = "Mixed Use")]
    #[strum(serialize = "Mixed Use")]
    MixedUse,
    Agricultural,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
pub enum Furnishing {
    Furnished,
    #[serde(rename = "Semi-Furnished")]
    #[strum(serialize = "Semi-Furnished")]
    SemiFurnished,
    Unfurnished,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
pub enum PropertyStatus {
    #[default]
    Available,
    #[serde(rename = "Under Contract")]
    #[strum(serialize = "Under Contract")]
    UnderContract,
    Sold,
    Rented,
    #[serde(rename = "Off Market")]
    #[strum(serialize = "Off Market")]
    OffMarket,
}

/// 业主 / 推荐人是已有客户还是随物业一起新建
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OwnerType {
    #[default]
    Existing,
    New,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

/// 建成年月
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PropertyAge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<Month>,
}

impl PropertyAge {
    /// `12 years old` / `March 12 years old`；未填年份时为空串
    pub fn display(&self, current_year: i32) -> String {
        let Some(year) = self.year else {
            return String::new();
        };
        let age = (current_year - year).max(0);
        let unit = if age == 1 { "year" } else { "years" };
        match self.month {
            Some(month) => format!("{} {} {} old", month, age, unit),
            None => format!("{} {} old", age, unit),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["city", "status"])]
#[mongo_index(fields["owner"])]
#[mongo_index(fields["createdBy"])]
#[mongo_index(fields["isActive"])]
#[mongo_index(fields["createdAt"], order = "desc")]
pub struct PropertyEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub address: String,
    pub city: String,
    pub zoning: Zoning,
    /// 仅 Mixed Use 时保留
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnishing: Option<Furnishing>,
    #[serde(default)]
    pub age: PropertyAge,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub per_sq_ft_rate: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
    /// 业主客户 id
    pub owner: String,
    #[serde(default)]
    pub owner_type: OwnerType,
    /// 推荐人客户 id
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<OwnerType>,
    #[serde(default)]
    pub files: Vec<Attachment>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

impl PropertyEntity {
    /// 重算总价，并按分区清理备注
    pub fn normalize(&mut self) {
        self.total_price = total_price(self.area, self.per_sq_ft_rate);
        if self.zoning != Zoning::MixedUse {
            self.zoning_note = None;
        }
    }
}

pub fn total_price(area: f64, per_sq_ft_rate: f64) -> f64 {
    area * per_sq_ft_rate
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyBrief {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub address: String,
    pub city: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub total_price: f64,
}

impl From<&PropertyEntity> for PropertyBrief {
    fn from(p: &PropertyEntity) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            address: p.address.clone(),
            city: p.city.clone(),
            property_type: p.property_type,
            status: p.status,
            total_price: p.total_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: PropertyEntity,
    pub age_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_info: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_client: Option<ClientBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_recomputes_price_and_drops_note() {
        let mut p = PropertyEntity { area: 1200.0, per_sq_ft_rate: 8500.0, zoning_note: Some("shops below".into()), ..Default::default() };
        p.normalize();
        assert_eq!(p.total_price, 10_200_000.0);
        assert_eq!(p.zoning_note, None);

        p.zoning = Zoning::MixedUse;
        p.zoning_note = Some("shops below".into());
        p.area = 0.0;
        p.normalize();
        assert_eq!(p.total_price, 0.0);
        assert_eq!(p.zoning_note.as_deref(), Some("shops below"));
    }

    #[test]
    fn age_display_formats() {
        assert_eq!(PropertyAge::default().display(2024), "");
        assert_eq!(PropertyAge { year: Some(2014), month: None }.display(2024), "10 years old");
        assert_eq!(PropertyAge { year: Some(2023), month: Some(Month::March) }.display(2024), "March 1 year old");
    }

    #[test]
    fn enum_labels_match_stored_values() {
        assert_eq!(serde_json::to_value(Zoning::MixedUse).unwrap(), "Mixed Use");
        assert_eq!(serde_json::to_value(PropertyStatus::OffMarket).unwrap(), "Off Market");
        assert_eq!(Furnishing::SemiFurnished.to_string(), "Semi-Furnished");
        let p = PropertyEntity { ref_client: Some("b".repeat(24)), ..Default::default() };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["ref"], "b".repeat(24));
        assert_eq!(json["type"], "Apartment");
    }
}
