//! Subscriptions Handlers
//!
//! Thin CRUD surface (spec §1 scopes the full REST surface out as an
//! external collaborator); this exists only so the core is runnable and
//! testable end to end.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    errors::AppError,
    responses::{resources::SubscriptionResource, ApiResponse, PaginatedResponse},
    services::SubscriptionService,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    #[validate(url(message = "target_url must be an absolute URL"))]
    pub target_url: String,
    #[validate(length(min = 8, message = "secret must be at least 8 bytes"))]
    pub secret: String,
    #[validate(length(min = 1, message = "event_types must be non-empty"))]
    pub event_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn store(
    State(state): State<AppState>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Result<Json<ApiResponse<SubscriptionResource>>, AppError> {
    body.validate()?;

    let service = SubscriptionService::new(&state.db);
    let subscription = service
        .create(&body.target_url, &body.secret, &body.event_types)
        .await?;

    Ok(Json(ApiResponse::success(subscription.into())))
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<SubscriptionResource>>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let service = SubscriptionService::new(&state.db);
    let (subscriptions, total) = service.list(page, per_page).await?;

    let resources: Vec<SubscriptionResource> =
        subscriptions.into_iter().map(Into::into).collect();

    Ok(Json(PaginatedResponse::new(resources, total, page, per_page)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SubscriptionResource>>, AppError> {
    let service = SubscriptionService::new(&state.db);
    let subscription = service
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("subscription {id} not found")))?;

    Ok(Json(ApiResponse::success(subscription.into())))
}
