use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use serde::Serialize;
use std::io;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

const DUPLICATE_KEY: i32 = 11000;

/// 单个字段的校验错误
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// HTTP 错误响应结构
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    // ==== 常规业务错误 ====
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Validation failed")]
    InvalidFields(Vec<FieldError>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden access")]
    Forbidden,

    // ==== 系统错误 ====
    #[error("MongoDB error: {0}")]
    Mongo(#[from] MongoError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::InvalidFields(flatten_validation_errors(&e, ""))
    }
}

/// 展开嵌套结构体/列表的校验错误，字段名用 `.` 拼接（如 `commission.value`）
pub fn flatten_validation_errors(errors: &ValidationErrors, prefix: &str) -> Vec<FieldError> {
    let mut out = vec![];
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("Invalid value ({})", err.code));
                    out.push(FieldError { field: path.clone(), message });
                }
            }
            ValidationErrorsKind::Struct(nested) => out.extend(flatten_validation_errors(nested, &path)),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    out.extend(flatten_validation_errors(nested, &format!("{}[{}]", path, index)));
                }
            }
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// 唯一索引冲突（E11000）
pub fn is_duplicate_key(e: &MongoError) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        ErrorKind::Command(ce) => ce.code == DUPLICATE_KEY,
        _ => false,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Mongo(e) if is_duplicate_key(e) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (message, errors) = match self {
            AppError::InvalidFields(fields) => (self.to_string(), Some(fields.clone())),
            AppError::Mongo(e) if is_duplicate_key(e) => ("A record with the same unique value already exists".to_string(), None),
            AppError::Mongo(_) | AppError::Json(_) | AppError::Io(_) | AppError::Internal(_) => {
                error!("{:?}", self);
                ("Service error".to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        HttpResponse::build(status).json(ErrorResponse { code: status.as_u16(), message, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
        name: String,
        #[validate(range(min = 0.0))]
        area: f64,
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::not_found("Client").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Validation("bad".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("no token".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Internal("boom".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_errors_keep_field_messages() {
        let err = Sample { name: "A".into(), area: -1.0 }.validate().unwrap_err();
        let fields = flatten_validation_errors(&err, "");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "area");
        assert_eq!(fields[1], FieldError { field: "name".into(), message: "Name must be at least 2 characters".into() });
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let resp = AppError::Internal("connection reset by peer".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Service error");
        assert_eq!(json["code"], 500);
    }

    #[actix_web::test]
    async fn invalid_fields_are_listed() {
        let resp = AppError::InvalidFields(vec![FieldError { field: "email".into(), message: "Please enter a valid email".into() }]).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errors"][0]["field"], "email");
    }
}
