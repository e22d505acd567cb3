use mongo_macro::MongoIndexModelProvider as MongoDeriveMongoIndex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub const USER_COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Agent,
}

/// 后台用户（经纪人）
///
/// 不要直接序列化到接口响应，对外使用 [`UserProfile`] / [`UserBrief`]
#[derive(Debug, Clone, Serialize, Deserialize, Default, MongoDeriveMongoIndex)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["email"], unique)]
pub struct UserEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// 小写存储
    pub email: String,
    /// Argon2 PHC 字符串
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 当前登录用户信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
}

impl From<&UserEntity> for UserProfile {
    fn from(u: &UserEntity) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            address: u.address.clone(),
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

/// 被引用时返回的用户摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserBrief {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&UserEntity> for UserBrief {
    fn from(u: &UserEntity) -> Self {
        Self { id: u.id.clone(), name: u.name.clone(), email: u.email.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_never_contains_password() {
        let user = UserEntity { id: "u".into(), email: "a@b.com".into(), password: "$argon2id$secret".into(), ..Default::default() };
        let json = serde_json::to_string(&UserProfile::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        let json = serde_json::to_value(UserBrief::from(&user)).unwrap();
        assert_eq!(json["_id"], "u");
        assert_eq!(json["email"], "a@b.com");
    }
}
