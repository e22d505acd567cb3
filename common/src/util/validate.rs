use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref OBJECT_ID_RE: Regex = Regex::new(r"^[0-9a-fA-F]{24}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 \-()]{8,19}$").unwrap();
}

pub fn is_object_id(value: &str) -> bool {
    OBJECT_ID_RE.is_match(value)
}

/// 引用字段必须是 24 位十六进制 id
pub fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    if is_object_id(value) { Ok(()) } else { Err(ValidationError::new("object_id").with_message("Invalid ID".into())) }
}

pub fn validate_object_ids(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| validate_object_id(v))
}

/// 电话号码：至少 10 个字符，可带 +、空格、横线和括号（+91-9876543210）
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    if phone.len() >= 10 && PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("Phone number must be at least 10 characters".into()))
    }
}

/// 密码至少 6 位
pub fn validate_password(pwd: &str) -> Result<(), ValidationError> {
    if pwd.chars().count() < 6 {
        return Err(ValidationError::new("password").with_message("Password must be at least 6 characters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_format() {
        assert!(validate_object_id("507f1f77bcf86cd799439011").is_ok());
        assert!(validate_object_id("507f1f77bcf86cd79943901").is_err());
        assert!(validate_object_id("zzzf1f77bcf86cd799439011").is_err());
        assert!(validate_object_ids(&["507f1f77bcf86cd799439011".into(), "nope".into()]).is_err());
    }

    #[test]
    fn phone_format() {
        assert!(validate_phone("+91-9876543210").is_ok());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("98765").is_err());
        assert!(validate_phone("call me maybe").is_err());
    }

    #[test]
    fn password_length() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("abc").is_err());
    }
}
