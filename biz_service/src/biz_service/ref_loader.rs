use crate::biz_service::client_service::ClientService;
use crate::biz_service::property_service::PropertyService;
use crate::biz_service::user_service::UserService;
use crate::entitys::client_entity::ClientBrief;
use crate::entitys::property_entity::PropertyBrief;
use crate::entitys::user_entity::UserBrief;
use common::errors::AppError;
use common::repository_util::Repository;
use std::collections::{BTreeSet, HashMap};

/// 收集列表中引用到的 id，按集合各发一次 `$in` 查询
#[derive(Debug, Default)]
pub struct RefIds {
    clients: BTreeSet<String>,
    properties: BTreeSet<String>,
    users: BTreeSet<String>,
}

impl RefIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&mut self, id: Option<&String>) -> &mut Self {
        self.clients.extend(id.cloned());
        self
    }

    pub fn property(&mut self, id: Option<&String>) -> &mut Self {
        self.properties.extend(id.cloned());
        self
    }

    pub fn user(&mut self, id: Option<&String>) -> &mut Self {
        self.users.extend(id.cloned());
        self
    }

    pub fn users<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) -> &mut Self {
        self.users.extend(ids.into_iter().cloned());
        self
    }

    pub async fn load(&self) -> Result<Refs, AppError> {
        let mut refs = Refs::default();
        if !self.clients.is_empty() {
            let ids = self.clients.iter().cloned().collect::<Vec<_>>();
            for c in ClientService::get().dao.find_by_ids(&ids).await? {
                refs.clients.insert(c.id.clone(), ClientBrief::from(&c));
            }
        }
        if !self.properties.is_empty() {
            let ids = self.properties.iter().cloned().collect::<Vec<_>>();
            for p in PropertyService::get().dao.find_by_ids(&ids).await? {
                refs.properties.insert(p.id.clone(), PropertyBrief::from(&p));
            }
        }
        if !self.users.is_empty() {
            let ids = self.users.iter().cloned().collect::<Vec<_>>();
            for u in UserService::get().dao.find_by_ids(&ids).await? {
                refs.users.insert(u.id.clone(), UserBrief::from(&u));
            }
        }
        Ok(refs)
    }
}

/// 已加载的引用摘要；找不到的 id 返回 None
#[derive(Debug, Default)]
pub struct Refs {
    clients: HashMap<String, ClientBrief>,
    properties: HashMap<String, PropertyBrief>,
    users: HashMap<String, UserBrief>,
}

impl Refs {
    pub fn client(&self, id: Option<&String>) -> Option<ClientBrief> {
        id.and_then(|id| self.clients.get(id).cloned())
    }

    pub fn property(&self, id: Option<&String>) -> Option<PropertyBrief> {
        id.and_then(|id| self.properties.get(id).cloned())
    }

    pub fn user(&self, id: Option<&String>) -> Option<UserBrief> {
        id.and_then(|id| self.users.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deduplicated_and_none_is_skipped() {
        let a = "a".repeat(24);
        let mut ids = RefIds::new();
        ids.client(Some(&a)).client(Some(&a)).client(None).users(vec![&a, &a]);
        assert_eq!(ids.clients.len(), 1);
        assert_eq!(ids.users.len(), 1);
        assert!(ids.properties.is_empty());
    }

    #[tokio::test]
    async fn empty_ids_load_without_touching_the_database() {
        let refs = RefIds::new().load().await.unwrap();
        assert_eq!(refs.client(Some(&"x".to_string())), None);
        assert_eq!(refs.user(None), None);
    }
}
