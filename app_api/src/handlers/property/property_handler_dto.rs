use crate::handlers::client::client_handler_dto::CreateClientDto;
use biz_service::biz_service::property_service::PartyInput;
use biz_service::entitys::common_entity::{Attachment, PropertyType};
use biz_service::entitys::property_entity::{Furnishing, Month, OwnerType, PropertyAge, PropertyEntity, PropertyStatus, Zoning};
use common::errors::AppError;
use common::query_builder::PageRequest;
use common::repository_util::OrderType;
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::query_util::empty_as_none;
use common::util::validate::{is_object_id, validate_object_id};
use mongo_macro::QueryFilter;
use mongodb::bson::Document;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const MIN_BUILD_YEAR: i32 = 1900;

#[derive(Debug, Default, Deserialize, IntoParams, QueryFilter)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PropertyListQuery {
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
    pub status: Option<PropertyStatus>,
    /// 城市模糊匹配
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(like, field = "city")]
    pub city: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "type")]
    pub property_type: Option<PropertyType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "zoning")]
    pub zoning: Option<Zoning>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[query(eq, field = "owner")]
    pub owner: Option<String>,
}

impl PropertyListQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit, self.sort_by.as_deref(), self.sort_order)
    }

    /// 列表只返回未删除的物业
    pub fn filter(&self) -> Document {
        let mut filter = self.to_query_doc();
        filter.insert("isActive", true);
        filter
    }
}

/// 业主 / 推荐人：已有客户传 id，新客户传完整资料
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PartyDto {
    Existing(String),
    New(Box<CreateClientDto>),
}

impl PartyDto {
    pub fn into_input(self, kind: OwnerType, what: &str, caller: &str) -> Result<PartyInput, AppError> {
        match (kind, self) {
            (OwnerType::Existing, PartyDto::Existing(id)) => {
                let id = id.trim().to_string();
                if !is_object_id(&id) {
                    return Err(AppError::Validation(format!("{} must be a valid client id", what)));
                }
                Ok(PartyInput::Existing(id))
            }
            (OwnerType::New, PartyDto::New(dto)) => {
                let mut dto = *dto;
                dto.normalize();
                dto.validate()?;
                Ok(PartyInput::New(dto.into_entity(caller)))
            }
            (OwnerType::Existing, PartyDto::New(_)) => Err(AppError::Validation(format!("{} must be an existing client id", what))),
            (OwnerType::New, PartyDto::Existing(_)) => {
                Err(AppError::Validation(format!("{} details (name, email, phone) are required for a new client", what)))
            }
        }
    }
}

pub fn check_age(age: &PropertyAge, current_year: i32) -> Result<(), AppError> {
    match age.year {
        Some(year) if !(MIN_BUILD_YEAR..=current_year).contains(&year) => {
            Err(AppError::Validation(format!("Age year must be between {} and {}", MIN_BUILD_YEAR, current_year)))
        }
        None if age.month.is_some() => Err(AppError::Validation("Age year is required when month is given".into())),
        _ => Ok(()),
    }
}

fn normalize_files(files: Vec<Attachment>, now: i64) -> Vec<Attachment> {
    files.into_iter().map(|f| f.normalize(now)).collect()
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyDto {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    #[validate(length(min = 10, message = "Address must be at least 10 characters"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub zoning: Zoning,
    #[validate(length(max = 500, message = "Zoning note cannot exceed 500 characters"))]
    pub zoning_note: Option<String>,
    pub furnishing: Option<Furnishing>,
    pub age_year: Option<i32>,
    pub age_month: Option<Month>,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    pub area: f64,
    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub per_sq_ft_rate: f64,
    #[serde(default)]
    pub status: PropertyStatus,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 1000, message = "Additional notes cannot exceed 1000 characters"))]
    pub additional_notes: Option<String>,
    pub owner: PartyDto,
    pub owner_type: OwnerType,
    #[serde(rename = "ref")]
    pub ref_client: Option<PartyDto>,
    pub ref_type: Option<OwnerType>,
    #[serde(default)]
    #[validate(nested)]
    pub files: Vec<Attachment>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

/// 创建请求拆分后的结果：物业本体、业主、推荐人
pub struct NewProperty {
    pub property: PropertyEntity,
    pub owner: PartyInput,
    pub reference: Option<PartyInput>,
}

impl CreatePropertyDto {
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.address = self.address.trim().to_string();
        self.city = self.city.trim().to_string();
        self.zoning_note = trim_to_option(self.zoning_note.take());
        self.notes = trim_to_option(self.notes.take());
        self.additional_notes = trim_to_option(self.additional_notes.take());
        self.assigned_to = trim_to_option(self.assigned_to.take());
    }

    pub fn into_parts(self, caller: &str, current_year: i32) -> Result<NewProperty, AppError> {
        let age = PropertyAge { year: self.age_year, month: self.age_month };
        check_age(&age, current_year)?;
        let owner = self.owner.into_input(self.owner_type, "Owner", caller)?;
        let reference = match self.ref_client {
            Some(party) => Some(party.into_input(self.ref_type.unwrap_or_default(), "Reference", caller)?),
            None => None,
        };
        let now = now();
        let property = PropertyEntity {
            id: build_id(),
            title: self.title,
            address: self.address,
            city: self.city,
            zoning: self.zoning,
            zoning_note: self.zoning_note,
            furnishing: self.furnishing,
            age,
            property_type: self.property_type,
            area: self.area,
            per_sq_ft_rate: self.per_sq_ft_rate,
            total_price: 0.0,
            status: self.status,
            notes: self.notes,
            additional_notes: self.additional_notes,
            owner: String::new(),
            owner_type: self.owner_type,
            ref_client: None,
            ref_type: None,
            files: normalize_files(self.files, now),
            created_by: caller.to_string(),
            assigned_to: self.assigned_to,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        Ok(NewProperty { property, owner, reference })
    }
}

/// 业主与推荐人创建后不可修改，请求中的 owner / ref 会被忽略
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyDto {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "Address must be at least 10 characters"))]
    pub address: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: Option<String>,
    pub zoning: Option<Zoning>,
    #[validate(length(max = 500, message = "Zoning note cannot exceed 500 characters"))]
    pub zoning_note: Option<String>,
    pub furnishing: Option<Furnishing>,
    pub age_year: Option<i32>,
    pub age_month: Option<Month>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    pub area: Option<f64>,
    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub per_sq_ft_rate: Option<f64>,
    pub status: Option<PropertyStatus>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 1000, message = "Additional notes cannot exceed 1000 characters"))]
    pub additional_notes: Option<String>,
    #[validate(nested)]
    pub files: Option<Vec<Attachment>>,
    #[validate(custom(function = "validate_object_id"))]
    pub assigned_to: Option<String>,
}

impl UpdatePropertyDto {
    pub fn normalize(&mut self) {
        self.title = self.title.take().map(|s| s.trim().to_string());
        self.address = self.address.take().map(|s| s.trim().to_string());
        self.city = self.city.take().map(|s| s.trim().to_string());
    }

    pub fn apply(self, property: &mut PropertyEntity, current_year: i32) -> Result<(), AppError> {
        if self.age_year.is_some() || self.age_month.is_some() {
            let age = PropertyAge {
                year: self.age_year.or(property.age.year),
                month: self.age_month.or(property.age.month),
            };
            check_age(&age, current_year)?;
            property.age = age;
        }
        if let Some(title) = self.title {
            property.title = title;
        }
        if let Some(address) = self.address {
            property.address = address;
        }
        if let Some(city) = self.city {
            property.city = city;
        }
        if let Some(zoning) = self.zoning {
            property.zoning = zoning;
        }
        if let Some(note) = self.zoning_note {
            property.zoning_note = trim_to_option(Some(note));
        }
        if let Some(furnishing) = self.furnishing {
            property.furnishing = Some(furnishing);
        }
        if let Some(property_type) = self.property_type {
            property.property_type = property_type;
        }
        if let Some(area) = self.area {
            property.area = area;
        }
        if let Some(rate) = self.per_sq_ft_rate {
            property.per_sq_ft_rate = rate;
        }
        if let Some(status) = self.status {
            property.status = status;
        }
        if let Some(notes) = self.notes {
            property.notes = trim_to_option(Some(notes));
        }
        if let Some(notes) = self.additional_notes {
            property.additional_notes = trim_to_option(Some(notes));
        }
        if let Some(files) = self.files {
            property.files = normalize_files(files, now());
        }
        if let Some(assigned_to) = self.assigned_to {
            property.assigned_to = trim_to_option(Some(assigned_to));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;
    use serde_json::json;

    const USER: &str = "507f1f77bcf86cd799439011";
    const OWNER: &str = "507f1f77bcf86cd799439022";

    fn create_json(owner: serde_json::Value, owner_type: &str) -> serde_json::Value {
        json!({
            "title": "Sea View Flat",
            "address": "12 Marine Drive, Colaba",
            "city": " Mumbai ",
            "zoning": "Mixed Use",
            "zoningNote": "shops on ground floor",
            "type": "Apartment",
            "area": 1200.0,
            "perSqFtRate": 25000.0,
            "status": "Under Contract",
            "ageYear": 2015,
            "ageMonth": "March",
            "owner": owner,
            "ownerType": owner_type,
            "files": [{ "name": "deed.pdf", "type": "application/pdf", "size": 500, "originalSize": 1000 }],
        })
    }

    #[test]
    fn list_filter_is_active_only() {
        let q = Query::<PropertyListQuery>::from_query("status=Under%20Contract&city=pune&type=Villa&zoning=Mixed%20Use").unwrap();
        let filter = q.filter();
        assert_eq!(filter.get_bool("isActive").unwrap(), true);
        assert_eq!(filter.get_str("status").unwrap(), "Under Contract");
        assert_eq!(filter.get_str("type").unwrap(), "Villa");
        assert_eq!(filter.get_str("zoning").unwrap(), "Mixed Use");
        assert_eq!(filter.get_document("city").unwrap().get_str("$options").unwrap(), "i");
    }

    #[test]
    fn create_with_existing_owner() {
        let mut dto: CreatePropertyDto = serde_json::from_value(create_json(json!(OWNER), "existing")).unwrap();
        dto.normalize();
        assert!(dto.validate().is_ok());
        let parts = dto.into_parts(USER, 2025).unwrap();
        assert!(matches!(parts.owner, PartyInput::Existing(ref id) if id == OWNER));
        assert!(parts.reference.is_none());
        assert_eq!(parts.property.city, "Mumbai");
        assert_eq!(parts.property.created_by, USER);
        assert_eq!(parts.property.age.year, Some(2015));
        assert_eq!(parts.property.files[0].compression_ratio, Some(50.0));
        assert!(parts.property.files[0].uploaded_at.is_some());
    }

    #[test]
    fn create_with_new_owner_builds_client() {
        let owner = json!({ "name": "Ravi Kumar", "email": "Ravi@x.com", "phone": "9876543210" });
        let dto: CreatePropertyDto = serde_json::from_value(create_json(owner, "new")).unwrap();
        let parts = dto.into_parts(USER, 2025).unwrap();
        let PartyInput::New(client) = parts.owner else { panic!("expected new owner") };
        assert_eq!(client.email, "ravi@x.com");
        assert_eq!(client.assigned_to.as_deref(), Some(USER));
    }

    #[test]
    fn owner_type_must_match_payload() {
        let dto: CreatePropertyDto = serde_json::from_value(create_json(json!(OWNER), "new")).unwrap();
        assert!(matches!(dto.into_parts(USER, 2025), Err(AppError::Validation(_))));

        let owner = json!({ "name": "Ravi Kumar", "email": "ravi@x.com", "phone": "9876543210" });
        let dto: CreatePropertyDto = serde_json::from_value(create_json(owner, "existing")).unwrap();
        assert!(dto.into_parts(USER, 2025).is_err());
    }

    #[test]
    fn age_year_is_bounded() {
        assert!(check_age(&PropertyAge { year: Some(1899), month: None }, 2025).is_err());
        assert!(check_age(&PropertyAge { year: Some(2026), month: None }, 2025).is_err());
        assert!(check_age(&PropertyAge { year: Some(2025), month: None }, 2025).is_ok());
        assert!(check_age(&PropertyAge { year: None, month: Some(Month::May) }, 2025).is_err());
        assert!(check_age(&PropertyAge::default(), 2025).is_ok());
    }

    #[test]
    fn create_rejects_short_fields() {
        let mut value = create_json(json!(OWNER), "existing");
        value["title"] = json!("ab");
        value["address"] = json!("short");
        value["area"] = json!(-5.0);
        let dto: CreatePropertyDto = serde_json::from_value(value).unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("address"));
        assert!(fields.contains_key("area"));
    }

    #[test]
    fn update_merges_age_and_fields() {
        let dto: CreatePropertyDto = serde_json::from_value(create_json(json!(OWNER), "existing")).unwrap();
        let mut property = dto.into_parts(USER, 2025).unwrap().property;
        let patch: UpdatePropertyDto = serde_json::from_value(json!({ "ageMonth": "June", "area": 1000.0 })).unwrap();
        patch.apply(&mut property, 2025).unwrap();
        assert_eq!(property.age, PropertyAge { year: Some(2015), month: Some(Month::June) });
        assert_eq!(property.area, 1000.0);
        assert_eq!(property.owner_type, OwnerType::Existing);
    }
}
