use crate::query_builder::PageRequest;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOptions, ReplaceOptions};
use mongodb::{error::Result, Collection};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderType::Asc),
            "desc" => Ok(OrderType::Desc),
            _ => Err("sortOrder must be asc or desc".to_string()),
        }
    }
}

impl OrderType {
    pub fn direction(&self) -> i32 {
        match self {
            OrderType::Asc => 1,
            OrderType::Desc => -1,
        }
    }
}

/// 列表接口返回的分页信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub limit: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: &PageRequest, total: u64) -> Self {
        Self {
            current_page: page.page,
            total_pages: total.div_ceil(page.limit),
            total,
            limit: page.limit,
            has_next_page: page.page.saturating_mul(page.limit) < total,
            has_prev_page: page.page > 1,
        }
    }
}

pub struct PageResult<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult { items: self.items.into_iter().map(f).collect(), pagination: self.pagination }
    }
}

#[async_trait]
pub trait Repository<T> {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<T>>;
    async fn insert(&self, entity: &T) -> Result<()>;
    async fn save(&self, id: &str, entity: &T) -> Result<u64>;
    async fn find_one(&self, filter: Document) -> Result<Option<T>>;
    async fn find_many(&self, filter: Document, sort: Option<Document>) -> Result<Vec<T>>;
    async fn count(&self, filter: Document) -> Result<u64>;
    async fn exists(&self, filter: Document) -> Result<bool>;
    async fn up_property(&self, id: &str, field: &str, value: Bson) -> Result<u64>;
    async fn update(&self, filter: Document, update: Document) -> Result<u64>;
    async fn delete_by_id(&self, id: &str) -> Result<u64>;
    async fn delete(&self, filter: Document) -> Result<u64>;
    async fn query_page(&self, filter: Document, page: &PageRequest) -> Result<PageResult<T>>;
    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>>;
}

#[derive(Debug)]
pub struct BaseRepository<T: Send + Sync> {
    pub collection: Collection<T>,
    _marker: PhantomData<T>,
}

impl<T: Send + Sync> BaseRepository<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection, _marker: Default::default() }
    }
}

#[async_trait]
impl<T> Repository<T> for BaseRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.find_many(doc! { "_id": { "$in": ids.to_vec() } }, None).await
    }

    async fn insert(&self, entity: &T) -> Result<()> {
        self.collection.insert_one(entity).await?;
        Ok(())
    }

    async fn save(&self, id: &str, entity: &T) -> Result<u64> {
        let options = ReplaceOptions::builder().upsert(false).build();
        let result = self.collection.replace_one(doc! { "_id": id }, entity).with_options(options).await?;
        Ok(result.matched_count)
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.collection.find_one(filter).await
    }

    async fn find_many(&self, filter: Document, sort: Option<Document>) -> Result<Vec<T>> {
        let options = FindOptions::builder().sort(sort).build();
        let cursor = self.collection.find(filter).with_options(options).await?;
        cursor.try_collect().await
    }

    async fn count(&self, filter: Document) -> Result<u64> {
        self.collection.count_documents(filter).await
    }

    async fn exists(&self, filter: Document) -> Result<bool> {
        Ok(self.collection.count_documents(filter).limit(1).await? > 0)
    }

    async fn up_property(&self, id: &str, field: &str, value: Bson) -> Result<u64> {
        let result = self.collection.update_one(doc! { "_id": id }, doc! { "$set": { field: value } }).await?;
        Ok(result.matched_count)
    }

    async fn update(&self, filter: Document, update: Document) -> Result<u64> {
        let result = self.collection.update_many(filter, update).await?;
        Ok(result.modified_count)
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }

    async fn delete(&self, filter: Document) -> Result<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn query_page(&self, filter: Document, page: &PageRequest) -> Result<PageResult<T>> {
        let total = self.collection.count_documents(filter.clone()).await?;
        let find_options = FindOptions::builder()
            .sort(page.sort_doc())
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();
        let cursor = self.collection.find(filter).with_options(find_options).await?;
        let items: Vec<T> = cursor.try_collect().await?;
        Ok(PageResult { items, pagination: Pagination::new(page, total) })
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let cursor = self.collection.aggregate(pipeline).await?;
        cursor.try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, limit: u64) -> PageRequest {
        PageRequest::new(Some(page), Some(limit), None, None).unwrap()
    }

    #[test]
    fn pagination_first_page() {
        let p = Pagination::new(&page(1, 10), 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn pagination_last_page() {
        let p = Pagination::new(&page(3, 10), 25);
        assert_eq!(p.current_page, 3);
        assert!(!p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn pagination_exact_multiple() {
        let p = Pagination::new(&page(2, 10), 20);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next_page);
    }

    #[test]
    fn pagination_empty_collection() {
        let p = Pagination::new(&page(1, 10), 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn pagination_does_not_overflow() {
        let page = PageRequest { page: u64::MAX, limit: 100, ..Default::default() };
        let p = Pagination::new(&page, 5);
        assert!(!p.has_next_page);
        assert!(p.has_prev_page);
        assert_eq!(p.total_pages, 1);
    }

    #[test]
    fn order_type_parses_case_insensitively() {
        assert_eq!("ASC".parse::<OrderType>().unwrap(), OrderType::Asc);
        assert_eq!("desc".parse::<OrderType>().unwrap(), OrderType::Desc);
        assert!("up".parse::<OrderType>().is_err());
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(&page(1, 5), 6)).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNextPage"], true);
    }
}
