//! Ingest Service (spec §4.1)
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::PgPool;

use crate::{
    errors::AppError,
    models::DeliverTask,
    queue::QueueClient,
    repositories::{SubscriptionRepository, WebhookRepository},
};

pub struct IngestOutcome {
    pub webhook_id: i64,
    pub accepted_at: DateTime<Utc>,
}

pub struct IngestService<'a> {
    db: &'a PgPool,
    queue: &'a QueueClient,
}

impl<'a> IngestService<'a> {
    pub fn new(db: &'a PgPool, queue: &'a QueueClient) -> Self {
        Self { db, queue }
    }

    /// Validate against the subscription, persist the `Webhook` row, and
    /// enqueue its first delivery attempt. The webhook commit happens
    /// before enqueue is attempted; if enqueue fails the caller sees
    /// `QueueUnavailable` even though the webhook now exists (spec §4.1 —
    /// an accepted compromise, not a bug, resolved by manual reconcile).
    #[tracing::instrument(skip(self, payload))]
    pub async fn ingest(
        &self,
        subscription_id: i64,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<IngestOutcome, AppError> {
        let subscription = SubscriptionRepository::new(self.db)
            .find(subscription_id)
            .await?
            .ok_or(AppError::NotFound("subscription not found".into()))?;

        if !subscription.is_active {
            return Err(AppError::Inactive);
        }

        if !subscription.accepts(event_type) {
            return Err(AppError::UnknownEventType);
        }

        let webhook = WebhookRepository::new(self.db)
            .create(subscription_id, event_type, &payload)
            .await?;

        self.queue
            .enqueue_deliver(
                DeliverTask {
                    webhook_id: webhook.id,
                    attempt_number: 1,
                },
                ChronoDuration::zero(),
            )
            .await
            .map_err(|_| AppError::QueueUnavailable)?;

        Ok(IngestOutcome {
            webhook_id: webhook.id,
            accepted_at: Utc::now(),
        })
    }
}
