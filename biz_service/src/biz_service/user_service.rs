use crate::entitys::user_entity::{USER_COLLECTION, UserEntity};
use crate::manager::token_manager::TokenManager;
use crate::util::password::{hash_password, verify_password};
use common::errors::{AppError, is_duplicate_key};
use common::repository_util::{BaseRepository, Repository};
use log::{info, warn};
use mongodb::Database;
use mongodb::bson::doc;
use once_cell::sync::OnceCell;
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug)]
pub struct UserService {
    pub dao: BaseRepository<UserEntity>,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        let collection = db.collection(USER_COLLECTION);
        Self { dao: BaseRepository::new(collection) }
    }

    pub fn init(db: Database) {
        let instance = Self::new(db);
        INSTANCE.set(Arc::new(instance)).expect("INSTANCE already initialized");
    }

    /// 获取单例
    pub fn get() -> Arc<Self> {
        INSTANCE.get().expect("INSTANCE is not initialized").clone()
    }

    /// `user.password` 传入明文，入库前替换为哈希
    pub async fn register(&self, mut user: UserEntity) -> Result<(String, UserEntity), AppError> {
        user.email = user.email.trim().to_lowercase();
        if self.dao.exists(doc! { "email": &user.email }).await? {
            return Err(AppError::Validation("User already exists".into()));
        }
        user.password = hash_password(&user.password)?;
        self.dao.insert(&user).await.map_err(|e| {
            if is_duplicate_key(&e) { AppError::Validation("User already exists".into()) } else { AppError::Mongo(e) }
        })?;
        info!("user registered: {} {}", user.id, user.email);
        let token = TokenManager::get().issue(&user.id)?;
        Ok((token, user))
    }

    /// 邮箱不存在、密码错误或账号停用统一返回 401
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, UserEntity), AppError> {
        let email = email.trim().to_lowercase();
        let user = self.dao.find_one(doc! { "email": &email }).await?;
        let Some(user) = user.filter(|u| u.is_active) else {
            warn!("login rejected for {}", email);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };
        if !verify_password(password, &user.password)? {
            warn!("login rejected for {}", email);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        let token = TokenManager::get().issue(&user.id)?;
        Ok((token, user))
    }

    /// token 中的用户必须存在且启用
    pub async fn find_active(&self, user_id: &str) -> Result<UserEntity, AppError> {
        match self.dao.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::Unauthorized("Token is not valid".into())),
        }
    }
}

static INSTANCE: OnceCell<Arc<UserService>> = OnceCell::new();
