use anyhow::{Result, anyhow};
use common::config::AuthConfig;
use common::errors::AppError;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT 载荷：`sub` 为用户 id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 token 签发与校验
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenManager {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.is_empty() {
            return Err(anyhow!("auth.jwt_secret must be configured"));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.token_ttl_secs,
        })
    }

    pub fn init(config: &AuthConfig) -> Result<()> {
        let instance = Self::new(config)?;
        INSTANCE.set(Arc::new(instance)).map_err(|_| anyhow!("TokenManager already initialized"))
    }

    /// 获取全局实例（未初始化会 panic）
    pub fn get() -> Arc<Self> {
        INSTANCE.get().expect("TokenManager is not initialized").clone()
    }

    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        self.issue_at(user_id, chrono::Utc::now().timestamp())
    }

    fn issue_at(&self, user_id: &str, now_secs: i64) -> Result<String, AppError> {
        let claims = Claims { sub: user_id.to_string(), iat: now_secs, exp: now_secs + self.ttl_secs };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// 签名错误、过期或格式错误都返回 401
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Token is not valid".into()))
    }
}

static INSTANCE: OnceCell<Arc<TokenManager>> = OnceCell::new();

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> TokenManager {
        TokenManager::new(&AuthConfig { jwt_secret: secret.into(), token_ttl_secs: 3600 }).unwrap()
    }

    #[test]
    fn round_trip_keeps_subject() {
        let tm = manager("unit-test-secret");
        let token = tm.issue("507f1f77bcf86cd799439011").unwrap();
        let claims = tm.verify(&token).unwrap();
        assert_eq!(claims.sub, "507f1f77bcf86cd799439011");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tm = manager("unit-test-secret");
        let token = tm.issue_at("u1", chrono::Utc::now().timestamp() - 7200).unwrap();
        assert!(matches!(tm.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = manager("secret-a").issue("u1").unwrap();
        assert!(manager("secret-b").verify(&token).is_err());
        assert!(manager("secret-a").verify("not.a.jwt").is_err());
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        assert!(TokenManager::new(&AuthConfig { jwt_secret: String::new(), token_ttl_secs: 60 }).is_err());
    }
}
