//! Webhook Relay — library root

use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod responses;
pub mod routes;
pub mod services;
pub mod signing;
pub mod workers;

pub use errors::AppError;
pub use responses::ApiResponse;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool (the Durable Store).
    pub db: sqlx::PgPool,
    /// Redis client (optional; the Subscription Cache degrades without it).
    pub redis: Option<redis::Client>,
    /// Application configuration.
    pub config: Arc<config::AppConfig>,
    /// Read-through subscription cache.
    pub cache: cache::SubscriptionCache,
    /// Durable task queue client.
    pub queue: queue::QueueClient,
}
