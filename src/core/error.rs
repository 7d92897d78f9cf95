use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::shared::types::ApiResponse;

/// Per-field validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("File storage error: {0}")]
    FileStorage(String),

    #[error("Create failed: {0}")]
    CreateFailed(String),

    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a validation error for a single field
    pub fn field_error(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        AppError::Validation(errors)
    }

    /// Convert `validator` derive output into per-field messages
    pub fn from_validation_errors(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();

        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }

        AppError::Validation(fields)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(fields),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::FileStorage(ref msg) => {
                tracing::error!("File storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "File could not be stored".to_string(),
                    None,
                )
            }
            AppError::CreateFailed(ref msg) => {
                tracing::error!("Create failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Record could not be created".to_string(),
                    None,
                )
            }
            AppError::UpdateFailed(ref msg) => {
                tracing::error!("Update failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Record could not be updated".to_string(),
                    None,
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
