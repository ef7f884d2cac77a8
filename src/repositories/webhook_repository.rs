//! Webhook Repository
use sqlx::PgPool;

use crate::{errors::AppError, models::Webhook};

pub struct WebhookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WebhookRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        subscription_id: i64,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Webhook, AppError> {
        let webhook = sqlx::query_as::<_, Webhook>(
            r#"
            INSERT INTO webhooks (subscription_id, event_type, payload)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(subscription_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(self.pool)
        .await?;
        Ok(webhook)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Webhook>, AppError> {
        let webhook = sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(webhook)
    }
}
