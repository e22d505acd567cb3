pub mod client_role_service;
pub mod client_service;
pub mod lookout_service;
pub mod property_service;
pub mod ref_loader;
pub mod referral_service;
pub mod stats;
pub mod task_service;
pub mod thread_service;
pub mod user_service;

use crate::entitys::client_entity::ClientEntity;
use crate::entitys::client_role_entity::ClientRoleEntity;
use crate::entitys::lookout_entity::LookoutEntity;
use crate::entitys::property_entity::PropertyEntity;
use crate::entitys::referral_entity::ReferralEntity;
use crate::entitys::task_entity::TaskEntity;
use crate::entitys::thread_entity::{MessageEntity, ThreadEntity};
use crate::entitys::user_entity::UserEntity;
use common::index_trait::ensure_indexes;
use mongodb::Database;

pub fn init_service(db: Database) {
    user_service::UserService::init(db.clone());
    client_service::ClientService::init(db.clone());
    client_role_service::ClientRoleService::init(db.clone());
    property_service::PropertyService::init(db.clone());
    referral_service::ReferralService::init(db.clone());
    lookout_service::LookoutService::init(db.clone());
    task_service::TaskService::init(db.clone());
    thread_service::ThreadService::init(db);
}

/// 启动时按实体上的 `#[mongo_index]` 声明补建索引
pub async fn init_indexes() -> mongodb::error::Result<()> {
    ensure_indexes::<UserEntity>(&user_service::UserService::get().dao.collection).await?;
    ensure_indexes::<ClientEntity>(&client_service::ClientService::get().dao.collection).await?;
    ensure_indexes::<ClientRoleEntity>(&client_role_service::ClientRoleService::get().dao.collection).await?;
    ensure_indexes::<PropertyEntity>(&property_service::PropertyService::get().dao.collection).await?;
    ensure_indexes::<ReferralEntity>(&referral_service::ReferralService::get().dao.collection).await?;
    ensure_indexes::<LookoutEntity>(&lookout_service::LookoutService::get().dao.collection).await?;
    ensure_indexes::<TaskEntity>(&task_service::TaskService::get().dao.collection).await?;
    let threads = thread_service::ThreadService::get();
    ensure_indexes::<ThreadEntity>(&threads.dao.collection).await?;
    ensure_indexes::<MessageEntity>(&threads.message_dao.collection).await?;
    Ok(())
}
