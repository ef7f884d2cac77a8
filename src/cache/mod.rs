//! Subscription Cache (spec §4.2): read-through, write-invalidated,
//! backed by Redis. Degrades to a disabled passthrough when Redis isn't
//! configured, the same "continue without cache" posture the bootstrap
//! takes for a failed Redis connection.

use redis::AsyncCommands;

use crate::{errors::AppError, models::Subscription, repositories::SubscriptionRepository};

#[derive(Clone)]
pub struct SubscriptionCache {
    redis: Option<redis::Client>,
    ttl_seconds: u64,
}

impl SubscriptionCache {
    pub fn new(redis: Option<redis::Client>, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(id: i64) -> String {
        format!("subscription:{id}")
    }

    /// Read-through: serve from Redis if present, else load from `pool`
    /// and populate the cache with `T_sub` TTL (spec §4.2).
    pub async fn get(
        &self,
        pool: &sqlx::PgPool,
        id: i64,
    ) -> Result<Option<Subscription>, AppError> {
        if let Some(client) = &self.redis {
            if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
                let cached: Option<String> = conn.get(Self::key(id)).await.unwrap_or(None);
                if let Some(raw) = cached {
                    if let Ok(subscription) = serde_json::from_str::<Subscription>(&raw) {
                        return Ok(Some(subscription));
                    }
                }
            }
        }

        let subscription = SubscriptionRepository::new(pool).find(id).await?;

        if let (Some(client), Some(subscription)) = (&self.redis, &subscription) {
            if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
                if let Ok(raw) = serde_json::to_string(subscription) {
                    let _: Result<(), redis::RedisError> = conn
                        .set_ex(Self::key(id), raw, self.ttl_seconds)
                        .await;
                }
            }
        }

        Ok(subscription)
    }

    /// Invoked on any mutation to the subscription (update, delete,
    /// activate/deactivate). A cache that isn't configured has nothing to
    /// invalidate.
    pub async fn invalidate(&self, id: i64) {
        if let Some(client) = &self.redis {
            if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
                let _: Result<(), redis::RedisError> = conn.del(Self::key(id)).await;
            }
        }
    }
}
