use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::api::ApiResponse;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid phone number or PIN";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("invalid phone number or PIN")]
    InvalidCredentials,

    #[error("too many login attempts")]
    RateLimited,

    #[error("user account is disabled")]
    AccountDisabled,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// General (non field-level) validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::validation("error", message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // 23505: unique_violation
            if db_err.code().as_deref() == Some("23505") {
                let message = db_err.message();
                if message.contains("phone") {
                    return AppError::validation("phone", "A user with this phone number already exists.");
                }
                if message.contains("username") {
                    return AppError::validation("username", "A user with that username already exists.");
                }
            }
        }
        AppError::Storage(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Token(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Hashing(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.into_iter().next() {
            Some((field, errs)) => {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}.", field));
                AppError::validation(&field, message)
            }
            None => AppError::invalid("Invalid request."),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::AccountDisabled => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Storage(_)
            | AppError::Token(_)
            | AppError::Hashing(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (message, data) = match self {
            AppError::Validation { field, message } => {
                let mut data = Map::new();
                data.insert(field.clone(), Value::String(message.clone()));
                (message.clone(), Value::Object(data))
            }
            AppError::InvalidCredentials => (
                "Login failed".to_string(),
                json!({ "error": INVALID_CREDENTIALS_MESSAGE }),
            ),
            AppError::RateLimited => (
                "Too many login attempts. Please try again later.".to_string(),
                json!({ "error": "Account temporarily locked due to multiple failed attempts" }),
            ),
            AppError::AccountDisabled => (
                "Login failed".to_string(),
                json!({ "error": "User account is disabled." }),
            ),
            AppError::Unauthorized(reason) => (
                "Authentication required".to_string(),
                json!({ "error": reason }),
            ),
            internal => {
                error!("Request failed: {}", internal);
                (
                    "Internal server error".to_string(),
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        HttpResponse::build(self.status_code()).json(ApiResponse {
            success: false,
            message,
            data: Some(data),
        })
    }
}
