use crate::errors::AppError;
use crate::repository_util::OrderType;
use crate::util::query_util::contains_ci;
use lazy_static::lazy_static;
use mongodb::bson::{doc, Bson, Document};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// 分页与排序请求（来自 `page`、`limit`、`sortBy`、`sortOrder` 查询参数）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub sort_by: String,
    pub sort_order: OrderType,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE, sort_by: DEFAULT_SORT_FIELD.to_string(), sort_order: OrderType::Desc }
    }
}

impl PageRequest {
    /// page 最小为 1；limit 限制在 1..=100；排序字段只允许普通字段路径；
    /// 跳过条数超出 i64 范围的 page 返回 400
    pub fn new(page: Option<u64>, limit: Option<u64>, sort_by: Option<&str>, sort_order: Option<OrderType>) -> Result<Self, AppError> {
        lazy_static! {
            static ref FIELD_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
        }
        let sort_by = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            Some(field) if FIELD_RE.is_match(field) => field.to_string(),
            Some(field) => return Err(AppError::Validation(format!("Invalid sort field: {}", field))),
            None => DEFAULT_SORT_FIELD.to_string(),
        };
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        match (page - 1).checked_mul(limit) {
            Some(skip) if skip <= i64::MAX as u64 => {}
            _ => return Err(AppError::Validation(format!("Invalid page: {}", page))),
        }
        Ok(Self {
            page,
            limit,
            sort_by,
            sort_order: sort_order.unwrap_or(OrderType::Desc),
        })
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn sort_doc(&self) -> Document {
        // 附加 _id 保证同值排序稳定
        doc! { self.sort_by.as_str(): self.sort_order.direction(), "_id": self.sort_order.direction() }
    }
}

/// 链式构造查询条件；`or()` 把当前条件块收拢为一个 `$or` 分支
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    clauses: Vec<Document>,
    current: Document,
    logic_op: Option<&'static str>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.current.insert(field, value.into());
        self
    }

    pub fn ne(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.current.insert(field, doc! { "$ne": value.into() });
        self
    }

    /// 不区分大小写的包含匹配，输入会先做正则转义
    pub fn like(mut self, field: &str, value: &str) -> Self {
        self.current.insert(field, contains_ci(value));
        self
    }

    pub fn in_array<T: Into<Bson>>(mut self, field: &str, values: Vec<T>) -> Self {
        let arr = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.current.insert(field, doc! { "$in": arr });
        self
    }

    pub fn or(mut self) -> Self {
        self.logic_op = Some("$or");
        self.clauses.push(std::mem::take(&mut self.current));
        self
    }

    pub fn build(mut self) -> Document {
        if !self.current.is_empty() {
            self.clauses.push(self.current);
        }
        match self.logic_op {
            Some(op) => doc! { op: self.clauses },
            None if self.clauses.len() == 1 => self.clauses.remove(0),
            None => doc! {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults() {
        let page = PageRequest::new(None, None, None, None).unwrap();
        assert_eq!(page, PageRequest::default());
        assert_eq!(page.skip(), 0);
        assert_eq!(page.sort_doc(), doc! { "createdAt": -1, "_id": -1 });
    }

    #[test]
    fn page_request_clamps_values() {
        let page = PageRequest::new(Some(0), Some(1000), Some("name"), Some(OrderType::Asc)).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.sort_doc(), doc! { "name": 1, "_id": 1 });

        let page = PageRequest::new(Some(3), Some(0), None, None).unwrap();
        assert_eq!(page.limit, 1);
        assert_eq!(page.skip(), 2);
    }

    #[test]
    fn skip_uses_page_and_limit() {
        let page = PageRequest::new(Some(4), Some(25), None, None).unwrap();
        assert_eq!(page.skip(), 75);
    }

    #[test]
    fn huge_page_is_rejected() {
        assert!(PageRequest::new(Some(u64::MAX), Some(100), None, None).is_err());
        assert!(PageRequest::new(Some(u64::MAX / 10), None, None, None).is_err());
        let last = i64::MAX as u64 / MAX_PAGE_SIZE;
        let page = PageRequest::new(Some(last), Some(MAX_PAGE_SIZE), None, None).unwrap();
        assert_eq!(page.skip(), (last - 1) * MAX_PAGE_SIZE);
    }

    #[test]
    fn skip_saturates_for_hand_built_pages() {
        let page = PageRequest { page: u64::MAX, limit: MAX_PAGE_SIZE, ..Default::default() };
        assert_eq!(page.skip(), u64::MAX);
    }

    #[test]
    fn sort_field_rejects_operators() {
        assert!(PageRequest::new(None, None, Some("$where"), None).is_err());
        assert!(PageRequest::new(None, None, Some("budget.min"), None).is_ok());
        assert_eq!(PageRequest::new(None, None, Some("  "), None).unwrap().sort_by, DEFAULT_SORT_FIELD);
    }

    #[test]
    fn or_builder_groups_clauses() {
        let filter = QueryBuilder::new().eq("name", "a").or().eq("email", "b").build();
        assert_eq!(filter, doc! { "$or": [ { "name": "a" }, { "email": "b" } ] });
    }

    #[test]
    fn single_block_is_returned_as_is() {
        let filter = QueryBuilder::new().eq("email", "x@y.com").ne("_id", "abc").build();
        assert_eq!(filter, doc! { "email": "x@y.com", "_id": { "$ne": "abc" } });
        assert_eq!(QueryBuilder::new().build(), doc! {});
    }
}
