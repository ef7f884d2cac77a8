//! DeliveryAttempt Repository
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{errors::AppError, models::DeliveryAttempt};

pub struct DeliveryAttemptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryAttemptRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert one attempt. Relies on the `(webhook_id, attempt_number)`
    /// unique constraint to make concurrent redelivery of the same task a
    /// no-op for every racer but one (spec §5: the loser's insert aborts
    /// and the worker treats it as a terminal duplicate).
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        subscription_id: i64,
        webhook_id: i64,
        attempt_number: i32,
        status_code: Option<i32>,
        response_body: Option<&str>,
        error_message: Option<&str>,
        is_success: bool,
    ) -> Result<DeliveryAttempt, AppError> {
        let attempt = sqlx::query_as::<_, DeliveryAttempt>(
            r#"
            INSERT INTO delivery_attempts
                (subscription_id, webhook_id, attempt_number, status_code,
                 response_body, error_message, is_success)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(subscription_id)
        .bind(webhook_id)
        .bind(attempt_number)
        .bind(status_code)
        .bind(response_body)
        .bind(error_message)
        .bind(is_success)
        .fetch_one(self.pool)
        .await?;
        Ok(attempt)
    }

    /// `true` if this exact attempt already exists — used to detect a
    /// duplicate redelivery before paying for the outbound HTTP call.
    pub async fn exists(&self, webhook_id: i64, attempt_number: i32) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM delivery_attempts WHERE webhook_id = $1 AND attempt_number = $2)",
        )
        .bind(webhook_id)
        .bind(attempt_number)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn list_for_webhook(&self, webhook_id: i64) -> Result<Vec<DeliveryAttempt>, AppError> {
        let attempts = sqlx::query_as::<_, DeliveryAttempt>(
            "SELECT * FROM delivery_attempts WHERE webhook_id = $1 ORDER BY attempt_number ASC",
        )
        .bind(webhook_id)
        .fetch_all(self.pool)
        .await?;
        Ok(attempts)
    }

    /// Delete up to `batch_size` rows older than `cutoff`. Returns the
    /// number of rows removed; the caller loops until this is zero.
    pub async fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM delivery_attempts
            WHERE id IN (
                SELECT id FROM delivery_attempts
                WHERE created_at < $1
                ORDER BY id
                LIMIT $2
            )
            "#,
        )
        .bind(cutoff)
        .bind(batch_size)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
