//! Health Check Handlers
//!
//! Kubernetes-compatible liveness/readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub redis: &'static str,
}

pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "application is running",
    })
}

pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let redis_status = match &state.redis {
        Some(client) => match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => match redis::cmd("PING")
                .query_async::<String>(&mut conn)
                .await
            {
                Ok(_) => "connected",
                Err(_) => "disconnected",
            },
            Err(_) => "disconnected",
        },
        None => "not_configured",
    };

    let all_healthy = db_status == "connected";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if all_healthy { "ready" } else { "not_ready" },
            database: db_status,
            redis: redis_status,
        }),
    )
}
