//! Queue Repository
//!
//! Raw Postgres access backing the `queue_tasks` table. `crate::queue`
//! builds the typed enqueue/consume/ack contract on top of this.
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;

use crate::{errors::AppError, models::QueueTaskRow};

pub struct QueueRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> QueueRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(
        &self,
        lane: &str,
        payload: &serde_json::Value,
        delay: ChronoDuration,
    ) -> Result<i64, AppError> {
        let visible_at = Utc::now() + delay;
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO queue_tasks (lane, payload, visible_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(lane)
        .bind(payload)
        .bind(visible_at)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Atomically claim one visible, unlocked task in `lane`. The
    /// `FOR UPDATE SKIP LOCKED` clause lets multiple worker processes poll
    /// concurrently without blocking on each other.
    pub async fn dequeue(
        &self,
        lane: &str,
        worker_id: &str,
        visibility_timeout: ChronoDuration,
    ) -> Result<Option<QueueTaskRow>, AppError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, QueueTaskRow>(
            r#"
            SELECT * FROM queue_tasks
            WHERE lane = $1 AND visible_at <= NOW()
            ORDER BY visible_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
            "#,
        )
        .bind(lane)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task) = claimed else {
            tx.commit().await?;
            return Ok(None);
        };

        let next_visible_at = Utc::now() + visibility_timeout;
        let locked = sqlx::query_as::<_, QueueTaskRow>(
            r#"
            UPDATE queue_tasks
            SET locked_at = NOW(), locked_by = $2, visible_at = $3, attempts = attempts + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(worker_id)
        .bind(next_visible_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(locked))
    }

    pub async fn ack(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM queue_tasks WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Release the lock and make the task visible again after `delay`.
    pub async fn nack(&self, id: i64, delay: ChronoDuration) -> Result<(), AppError> {
        let visible_at = Utc::now() + delay;
        sqlx::query(
            "UPDATE queue_tasks SET locked_at = NULL, locked_by = NULL, visible_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(visible_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// True if `cleanup` already has a pending (unlocked, future or due)
    /// task — lets the scheduler avoid piling up redundant sweeps if a
    /// previous one is still outstanding.
    pub async fn has_pending(&self, lane: &str) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM queue_tasks WHERE lane = $1 AND locked_at IS NULL)",
        )
        .bind(lane)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
