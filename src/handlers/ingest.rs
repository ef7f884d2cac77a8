//! Ingest Handler (spec §6) — the one core-relevant HTTP endpoint.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{errors::AppError, services::IngestService, AppState};

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub event_type: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub webhook_id: i64,
    pub status: &'static str,
}

/// `POST /ingest/:subscription_id`
#[tracing::instrument(skip(state, body))]
pub async fn ingest(
    State(state): State<AppState>,
    Path(subscription_id): Path<i64>,
    Json(body): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    if body.event_type.trim().is_empty() {
        return Err(AppError::MalformedPayload("event_type must not be empty".into()));
    }

    let service = IngestService::new(&state.db, &state.queue);
    let outcome = service
        .ingest(subscription_id, &body.event_type, body.payload)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            webhook_id: outcome.webhook_id,
            status: "accepted",
        }),
    ))
}
