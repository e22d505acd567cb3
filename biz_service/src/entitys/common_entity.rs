use common::util::common_utils::format_inr;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_AREA_UNIT: &str = "sq ft";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_area_unit() -> String {
    DEFAULT_AREA_UNIT.to_string()
}

/// 任务 / 需求单的优先级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// 佣金计算方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CommissionType {
    #[default]
    Fixed,
    Percentage,
}

/// 物业类型；`Commercial` 仅用于客户偏好与需求单
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash, ToSchema, AsRefStr, Display, EnumString)]
pub enum PropertyType {
    #[default]
    Apartment,
    House,
    Villa,
    Office,
    Shop,
    Warehouse,
    Land,
    Commercial,
}

/// 货币符号：INR 显示为 ₹，其余直接显示货币代码
pub fn currency_symbol(currency: &str) -> &str {
    if currency.is_empty() || currency == DEFAULT_CURRENCY { "₹" } else { currency }
}

/// 佣金展示文本；fixed 按千分位分组
pub fn commission_text(commission_type: CommissionType, value: f64) -> String {
    match commission_type {
        CommissionType::Percentage => format!("{}%", value),
        CommissionType::Fixed => format!("₹{}", format_inr(value)),
    }
}

/// 区间展示："Not specified" / "a - b" / "a+" / "Up to b"；0 视为未填写
pub fn range_text(min: Option<f64>, max: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    let min = min.filter(|v| *v != 0.0);
    let max = max.filter(|v| *v != 0.0);
    match (min, max) {
        (Some(a), Some(b)) => format!("{} - {}", fmt(a), fmt(b)),
        (Some(a), None) => format!("{}+", fmt(a)),
        (None, Some(b)) => format!("Up to {}", fmt(b)),
        (None, None) => "Not specified".to_string(),
    }
}

fn validate_min_max(min: Option<f64>, max: Option<f64>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(a), Some(b)) if a > b => Err(ValidationError::new("range").with_message("Minimum cannot exceed maximum".into())),
        _ => Ok(()),
    }
}

/// 数值区间（客户偏好里的预算、面积）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[validate(schema(function = "validate_number_range"))]
pub struct NumberRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Minimum cannot be negative"))]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Maximum cannot be negative"))]
    pub max: Option<f64>,
}

fn validate_number_range(range: &NumberRange) -> Result<(), ValidationError> {
    validate_min_max(range.min, range.max)
}

/// 预算区间，带货币
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[validate(schema(function = "validate_budget_range"))]
pub struct BudgetRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Minimum budget cannot be negative"))]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Maximum budget cannot be negative"))]
    pub max: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for BudgetRange {
    fn default() -> Self {
        Self { min: None, max: None, currency: default_currency() }
    }
}

impl BudgetRange {
    pub fn display(&self) -> String {
        let symbol = currency_symbol(&self.currency);
        range_text(self.min, self.max, |v| format!("{}{}", symbol, format_inr(v)))
    }
}

fn validate_budget_range(range: &BudgetRange) -> Result<(), ValidationError> {
    validate_min_max(range.min, range.max)
}

/// 面积区间，带单位
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[validate(schema(function = "validate_area_range"))]
pub struct AreaRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Minimum area cannot be negative"))]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Maximum area cannot be negative"))]
    pub max: Option<f64>,
    #[serde(default = "default_area_unit")]
    pub unit: String,
}

impl Default for AreaRange {
    fn default() -> Self {
        Self { min: None, max: None, unit: default_area_unit() }
    }
}

impl AreaRange {
    pub fn display(&self) -> String {
        let text = range_text(self.min, self.max, format_inr);
        if self.min.unwrap_or(0.0) == 0.0 && self.max.unwrap_or(0.0) == 0.0 {
            return text;
        }
        format!("{} {}", text, self.unit)
    }
}

fn validate_area_range(range: &AreaRange) -> Result<(), ValidationError> {
    validate_min_max(range.min, range.max)
}

/// 附件元数据（文件由客户端自行上传到云盘，这里只保存引用）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[validate(length(min = 1, message = "Attachment name is required"))]
    pub name: String,
    /// MIME 类型
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Size cannot be negative"))]
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Original size cannot be negative"))]
    pub original_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, message = "Compression ratio must be between 0 and 100"))]
    pub compression_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<i64>,
}

impl Attachment {
    /// 补全压缩率与上传时间
    pub fn normalize(mut self, now: i64) -> Self {
        if self.compression_ratio.is_none() {
            self.compression_ratio = self.original_size.map(|original| compression_ratio(self.size, original));
        }
        self.uploaded_at.get_or_insert(now);
        self
    }
}

/// round((1 - size / original) * 100)，限制在 0..=100
pub fn compression_ratio(size: i64, original_size: i64) -> f64 {
    if original_size <= 0 {
        return 0.0;
    }
    ((1.0 - size as f64 / original_size as f64) * 100.0).round().clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn range_text_covers_all_shapes() {
        let f = |v: f64| v.to_string();
        assert_eq!(range_text(None, None, f), "Not specified");
        assert_eq!(range_text(Some(0.0), Some(0.0), f), "Not specified");
        assert_eq!(range_text(Some(10.0), Some(20.0), f), "10 - 20");
        assert_eq!(range_text(Some(10.0), None, f), "10+");
        assert_eq!(range_text(None, Some(20.0), f), "Up to 20");
    }

    #[test]
    fn budget_display_uses_currency_symbol() {
        let budget = BudgetRange { min: Some(5_000_000.0), max: Some(7_500_000.0), currency: "INR".into() };
        assert_eq!(budget.display(), "₹50,00,000 - ₹75,00,000");
        let budget = BudgetRange { min: None, max: Some(900.0), currency: "USD".into() };
        assert_eq!(budget.display(), "Up to USD900");
        assert_eq!(BudgetRange::default().display(), "Not specified");
    }

    #[test]
    fn area_display_appends_unit() {
        let area = AreaRange { min: Some(1200.0), max: None, unit: "sq ft".into() };
        assert_eq!(area.display(), "1,200+ sq ft");
        assert_eq!(AreaRange::default().display(), "Not specified");
    }

    #[test]
    fn commission_text_by_type() {
        assert_eq!(commission_text(CommissionType::Percentage, 2.5), "2.5%");
        assert_eq!(commission_text(CommissionType::Fixed, 150000.0), "₹1,50,000");
    }

    #[test]
    fn compression_ratio_is_bounded() {
        assert_eq!(compression_ratio(250, 1000), 75.0);
        assert_eq!(compression_ratio(2000, 1000), 0.0);
        assert_eq!(compression_ratio(10, 0), 0.0);
    }

    #[test]
    fn attachment_normalize_fills_missing_fields() {
        let file = Attachment { name: "deed.pdf".into(), size: 400, original_size: Some(1000), ..Default::default() }.normalize(42);
        assert_eq!(file.compression_ratio, Some(60.0));
        assert_eq!(file.uploaded_at, Some(42));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let range = NumberRange { min: Some(10.0), max: Some(1.0) };
        assert!(range.validate().is_err());
        assert!(NumberRange { min: Some(1.0), max: None }.validate().is_ok());
    }

    #[test]
    fn priority_string_forms() {
        assert_eq!(Priority::Urgent.as_ref(), "urgent");
        assert_eq!(Priority::from_str("high").unwrap(), Priority::High);
        assert_eq!(serde_json::to_value(Priority::default()).unwrap(), "medium");
    }
}
