use log::{error, info};
use mongodb::{Collection, IndexModel};

pub trait MongoIndexModelProvider {
    fn index_models() -> Vec<IndexModel>;
}

/// 按索引名比对，只创建集合上还不存在的索引
pub async fn ensure_indexes<T: MongoIndexModelProvider + Send + Sync>(coll: &Collection<T>) -> mongodb::error::Result<()> {
    let existing: Vec<String> = match coll.list_index_names().await {
        Ok(names) => names,
        // 集合尚未创建时 listIndexes 返回 NamespaceNotFound
        Err(_) => vec![],
    };

    for target in T::index_models() {
        let name = target.options.as_ref().and_then(|o| o.name.clone()).unwrap_or_default();
        if existing.contains(&name) {
            continue;
        }
        match coll.create_index(target.clone()).await {
            Ok(_) => info!("index created: {}.{} {}", coll.name(), name, target.keys),
            Err(e) => {
                error!("index create failed: {}.{} {:?}", coll.name(), name, e);
                return Err(e);
            }
        }
    }
    Ok(())
}
