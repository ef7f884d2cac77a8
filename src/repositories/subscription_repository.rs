//! Subscription Repository
use sqlx::PgPool;

use crate::{errors::AppError, models::Subscription};

pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        target_url: &str,
        secret: &str,
        event_types: &[String],
    ) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (target_url, secret, event_types, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING *
            "#,
        )
        .bind(target_url)
        .bind(secret)
        .bind(event_types)
        .fetch_one(self.pool)
        .await?;
        Ok(subscription)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Subscription>, AppError> {
        let subscription =
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(subscription)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions ORDER BY id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(subscriptions)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
