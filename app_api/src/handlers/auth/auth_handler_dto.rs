use biz_service::entitys::user_entity::{UserEntity, UserProfile, UserRole};
use common::util::common_utils::{build_id, trim_to_option};
use common::util::date_util::now;
use common::util::validate::{validate_password, validate_phone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    /// 至少 6 位
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<UserRole>,
}

impl RegisterDto {
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = trim_to_option(self.phone.take());
        self.address = trim_to_option(self.address.take());
    }

    /// 密码此时仍是明文，由 UserService 负责哈希
    pub fn into_entity(self) -> UserEntity {
        let now = now();
        UserEntity {
            id: build_id(),
            name: self.name,
            email: self.email,
            password: self.password,
            phone: self.phone,
            address: self.address,
            role: self.role.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginDto {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

impl AuthResponse {
    pub fn new(token: String, user: &UserEntity) -> Self {
        Self { token, user: UserProfile::from(user) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str) -> RegisterDto {
        RegisterDto {
            name: " Priya Shah ".into(),
            email: email.into(),
            password: password.into(),
            phone: Some("  ".into()),
            address: None,
            role: None,
        }
    }

    #[test]
    fn register_normalizes_before_validation() {
        let mut dto = register(" Priya@Example.COM ", "secret1");
        dto.normalize();
        assert!(dto.validate().is_ok());
        let user = dto.into_entity();
        assert_eq!(user.email, "priya@example.com");
        assert_eq!(user.name, "Priya Shah");
        assert_eq!(user.phone, None);
        assert_eq!(user.role, UserRole::Agent);
        assert!(user.is_active);
    }

    #[test]
    fn register_rejects_short_password_and_bad_email() {
        let mut dto = register("not-an-email", "abc");
        dto.normalize();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn login_requires_password() {
        let dto = LoginDto { email: "a@b.com".into(), password: String::new() };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn auth_response_hides_password() {
        let mut dto = register("a@b.com", "secret1");
        dto.normalize();
        let user = dto.into_entity();
        let json = serde_json::to_value(AuthResponse::new("t".into(), &user)).unwrap();
        assert_eq!(json["token"], "t");
        assert!(json["user"].get("password").is_none());
        assert_eq!(json["user"]["email"], "a@b.com");
    }
}
