//! Webhook query & reconciliation handlers (spec §B.6, §B.7).

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;

use crate::{
    errors::AppError,
    models::{DeliverTask, DeliveryState},
    repositories::{DeliveryAttemptRepository, WebhookRepository},
    responses::{resources::DeliveryAttemptResource, ApiResponse},
    services::attempt_is_terminal,
    AppState,
};

/// Orphans older than this are eligible for manual reconciliation —
/// mirrors the "threshold" the spec leaves to the operator's judgment.
const RECONCILE_ORPHAN_THRESHOLD: ChronoDuration = ChronoDuration::minutes(5);

#[derive(Debug, Serialize)]
pub struct DeliveryAttemptsResponse {
    pub webhook_id: i64,
    pub state: DeliveryState,
    pub attempts: Vec<DeliveryAttemptResource>,
}

/// `GET /api/webhooks/{webhook_id}/delivery-attempts`
///
/// Returns the full attempt chain plus the `DeliveryState` a caller
/// would otherwise have to re-derive themselves from it (spec §4.3, §7).
pub async fn delivery_attempts(
    State(state): State<AppState>,
    Path(webhook_id): Path<i64>,
) -> Result<Json<ApiResponse<DeliveryAttemptsResponse>>, AppError> {
    let attempts = DeliveryAttemptRepository::new(&state.db)
        .list_for_webhook(webhook_id)
        .await?;

    let delivery_state = DeliveryState::derive(&attempts, state.config.delivery.max_attempts);
    let resources: Vec<DeliveryAttemptResource> = attempts.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(DeliveryAttemptsResponse {
        webhook_id,
        state: delivery_state,
        attempts: resources,
    })))
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub webhook_id: i64,
    pub re_enqueued: bool,
}

/// `POST /api/webhooks/{webhook_id}/reconcile`
///
/// Manual operator hook for the crash window described in spec §4.3: a
/// `DeliveryAttempt` gets recorded but the next-attempt enqueue never
/// happens, leaving the webhook stuck forever. Covers two orphan shapes:
/// a webhook with no attempts at all, and one whose last attempt was
/// retryable (not yet terminal per `attempt_is_terminal`) but has sat
/// untouched past the threshold. Not automatic reconciliation — a
/// narrow, operator-invoked escape hatch.
#[tracing::instrument(skip(state))]
pub async fn reconcile(
    State(state): State<AppState>,
    Path(webhook_id): Path<i64>,
) -> Result<Json<ApiResponse<ReconcileResponse>>, AppError> {
    let webhook = WebhookRepository::new(&state.db)
        .find(webhook_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("webhook {webhook_id} not found")))?;

    let attempts = DeliveryAttemptRepository::new(&state.db)
        .list_for_webhook(webhook_id)
        .await?;

    let max_attempts = state.config.delivery.max_attempts;
    let (is_orphan, next_attempt_number) = match attempts.last() {
        None => (
            Utc::now() - webhook.created_at > RECONCILE_ORPHAN_THRESHOLD,
            1,
        ),
        Some(last) => (
            !attempt_is_terminal(last, max_attempts)
                && Utc::now() - last.created_at > RECONCILE_ORPHAN_THRESHOLD,
            last.attempt_number + 1,
        ),
    };

    if !is_orphan {
        return Ok(Json(ApiResponse::success(ReconcileResponse {
            webhook_id,
            re_enqueued: false,
        })));
    }

    state
        .queue
        .enqueue_deliver(
            DeliverTask {
                webhook_id,
                attempt_number: next_attempt_number,
            },
            ChronoDuration::zero(),
        )
        .await?;

    Ok(Json(ApiResponse::success(ReconcileResponse {
        webhook_id,
        re_enqueued: true,
    })))
}
