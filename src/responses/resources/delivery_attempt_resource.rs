//! DeliveryAttempt Resource
use serde::Serialize;

use crate::models::DeliveryAttempt;

#[derive(Debug, Serialize)]
pub struct DeliveryAttemptResource {
    pub id: i64,
    pub webhook_id: i64,
    pub attempt_number: i32,
    pub status_code: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub is_success: bool,
    pub created_at: String,
}

impl From<DeliveryAttempt> for DeliveryAttemptResource {
    fn from(a: DeliveryAttempt) -> Self {
        Self {
            id: a.id,
            webhook_id: a.webhook_id,
            attempt_number: a.attempt_number,
            status_code: a.status_code,
            response_body: a.response_body,
            error_message: a.error_message,
            is_success: a.is_success,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}
