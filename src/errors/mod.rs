//! Application Error Handling
//!
//! A single `AppError` maps the taxonomy in spec §7 onto HTTP responses.
//! Inside the delivery worker these are absorbed into `DeliveryAttempt`
//! rows rather than propagated — see `crate::services::DeliveryService`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("subscription is inactive")]
    Inactive,

    #[error("event_type is not subscribed")]
    UnknownEventType,

    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue unavailable")]
    QueueUnavailable,

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Inactive => (
                StatusCode::CONFLICT,
                "subscription is inactive".to_string(),
                None,
            ),
            AppError::UnknownEventType => (
                StatusCode::CONFLICT,
                "event_type is not subscribed".to_string(),
                None,
            ),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation failed".to_string(),
                Some(format_validation_errors(errors)),
            ),
            AppError::MalformedPayload(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage unavailable".to_string(),
                    None,
                )
            }
            AppError::QueueUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "queue unavailable".to_string(),
                None,
            ),
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                    None,
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("unexpected error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unexpected error occurred".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(d) => json!({ "success": false, "message": message, "errors": d }),
            None => json!({ "success": false, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

fn format_validation_errors(errors: &ValidationErrors) -> serde_json::Value {
    let mut error_map = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {field}"))
            })
            .collect();
        error_map.insert(field.to_string(), json!(messages));
    }
    serde_json::Value::Object(error_map)
}

pub type HandlerResult<T> = Result<T, AppError>;
