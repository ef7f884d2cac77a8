//! API Route Definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Build all API routes
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api/health", health_routes())
        .merge(ingest_routes())
        .nest("/api/subscriptions", subscription_routes())
        .nest("/api/webhooks", webhook_routes())
        .with_state(state)
}

/// Health check routes (Kubernetes probes)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(handlers::health::liveness))
        .route("/ready", get(handlers::health::readiness))
}

/// Ingest API (spec §6) — the one core-relevant endpoint.
fn ingest_routes() -> Router<AppState> {
    Router::new().route("/ingest/{subscription_id}", post(handlers::ingest::ingest))
}

/// Minimal, explicitly-thin subscription management surface (spec §B.5).
fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::subscriptions::store))
        .route("/", get(handlers::subscriptions::index))
        .route("/{id}", get(handlers::subscriptions::show))
}

/// Delivery-attempt query surface and the manual reconcile hook
/// (spec §B.6, §B.7).
fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{webhook_id}/delivery-attempts",
            get(handlers::webhooks::delivery_attempts),
        )
        .route(
            "/{webhook_id}/reconcile",
            post(handlers::webhooks::reconcile),
        )
}
