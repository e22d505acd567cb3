use common::errors::AppError;
use common::repository_util::{BaseRepository, Repository};
use mongodb::bson::{Document, doc, from_document};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `$group` 计数结果，`_id` 为分组字段的值
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub count: i64,
}

fn group_stage(field: &str) -> Document {
    doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } }
}

fn sort_stage() -> Document {
    doc! { "$sort": { "count": -1, "_id": 1 } }
}

fn parse_counts(docs: Vec<Document>) -> Result<Vec<GroupCount>, AppError> {
    docs.into_iter().map(|d| from_document::<GroupCount>(d).map_err(AppError::from)).collect()
}

/// 按字段分组计数
pub async fn group_counts<T>(dao: &BaseRepository<T>, filter: Document, field: &str) -> Result<Vec<GroupCount>, AppError>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    let docs = dao.aggregate(vec![doc! { "$match": filter }, group_stage(field), sort_stage()]).await?;
    parse_counts(docs)
}

/// 数组字段先展开再分组计数
pub async fn group_counts_unwind<T>(dao: &BaseRepository<T>, filter: Document, field: &str) -> Result<Vec<GroupCount>, AppError>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    let pipeline = vec![doc! { "$match": filter }, doc! { "$unwind": format!("${}", field) }, group_stage(field), sort_stage()];
    parse_counts(dao.aggregate(pipeline).await?)
}

/// 单组汇总；集合为空时返回 `O::default()`
pub async fn overview<T, O>(dao: &BaseRepository<T>, filter: Document, accumulators: Document) -> Result<O, AppError>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
    O: DeserializeOwned + Default,
{
    let mut group = doc! { "_id": mongodb::bson::Bson::Null };
    group.extend(accumulators);
    let docs = dao.aggregate(vec![doc! { "$match": filter }, doc! { "$group": group }]).await?;
    match docs.into_iter().next() {
        Some(mut d) => {
            d.remove("_id");
            Ok(from_document(d)?)
        }
        None => Ok(O::default()),
    }
}

/// `{ $sum: { $cond: [{ $eq: [$field, value] }, 1, 0] } }`
pub fn count_if(field: &str, value: &str) -> Document {
    doc! { "$sum": { "$cond": [ { "$eq": [ format!("${}", field), value ] }, 1, 0 ] } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        total_items: i64,
        total_amount: f64,
    }

    #[test]
    fn count_if_builds_conditional_sum() {
        assert_eq!(count_if("status", "active"), doc! { "$sum": { "$cond": [ { "$eq": ["$status", "active"] }, 1, 0 ] } });
    }

    #[test]
    fn group_counts_accept_int32_and_null_keys() {
        let docs = vec![doc! { "_id": "buyer", "count": 3_i32 }, doc! { "_id": mongodb::bson::Bson::Null, "count": 1_i64 }];
        let counts = parse_counts(docs).unwrap();
        assert_eq!(counts[0], GroupCount { id: Some("buyer".into()), count: 3 });
        assert_eq!(counts[1].id, None);
    }

    #[test]
    fn overview_document_maps_to_struct() {
        let parsed: Sample = from_document(doc! { "totalItems": 4_i32, "totalAmount": 12.5 }).unwrap();
        assert_eq!(parsed, Sample { total_items: 4, total_amount: 12.5 });
    }
}
