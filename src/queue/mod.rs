//! Queue contract (spec §4.5): durable enqueue with delayed visibility,
//! at-least-once consume, explicit ack/nack. Implemented directly on the
//! application's Postgres pool rather than a separate broker — see
//! `repositories::QueueRepository` for the `FOR UPDATE SKIP LOCKED` dequeue.

use chrono::Duration as ChronoDuration;
use sqlx::PgPool;

use crate::{
    errors::AppError,
    models::{CleanupTask, DeliverTask, Lane, QueueTaskRow},
    repositories::QueueRepository,
};

/// A claimed task plus the ack token needed to remove or release it.
/// `task_id` doubles as the ack token: there is nothing to hide behind a
/// separate opaque handle when the queue and the lock live in the same row.
#[derive(Debug, Clone)]
pub struct Claimed<T> {
    pub task_id: i64,
    pub attempts: i32,
    pub task: T,
}

#[derive(Clone)]
pub struct QueueClient {
    pool: PgPool,
}

impl QueueClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue_deliver(
        &self,
        task: DeliverTask,
        delay: ChronoDuration,
    ) -> Result<i64, AppError> {
        let payload = serde_json::to_value(task).map_err(|e| AppError::Internal(e.to_string()))?;
        QueueRepository::new(&self.pool)
            .enqueue(Lane::Deliver.as_str(), &payload, delay)
            .await
    }

    pub async fn enqueue_cleanup(&self) -> Result<i64, AppError> {
        let payload =
            serde_json::to_value(CleanupTask {}).map_err(|e| AppError::Internal(e.to_string()))?;
        QueueRepository::new(&self.pool)
            .enqueue(Lane::Cleanup.as_str(), &payload, ChronoDuration::zero())
            .await
    }

    pub async fn cleanup_pending(&self) -> Result<bool, AppError> {
        QueueRepository::new(&self.pool)
            .has_pending(Lane::Cleanup.as_str())
            .await
    }

    pub async fn consume_deliver(
        &self,
        worker_id: &str,
        visibility_timeout: ChronoDuration,
    ) -> Result<Option<Claimed<DeliverTask>>, AppError> {
        self.consume(Lane::Deliver, worker_id, visibility_timeout)
            .await
    }

    pub async fn consume_cleanup(
        &self,
        worker_id: &str,
        visibility_timeout: ChronoDuration,
    ) -> Result<Option<Claimed<CleanupTask>>, AppError> {
        self.consume(Lane::Cleanup, worker_id, visibility_timeout)
            .await
    }

    async fn consume<T: serde::de::DeserializeOwned>(
        &self,
        lane: Lane,
        worker_id: &str,
        visibility_timeout: ChronoDuration,
    ) -> Result<Option<Claimed<T>>, AppError> {
        let row: Option<QueueTaskRow> = QueueRepository::new(&self.pool)
            .dequeue(lane.as_str(), worker_id, visibility_timeout)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let task: T = serde_json::from_value(row.payload)
            .map_err(|e| AppError::Internal(format!("corrupt queue payload: {e}")))?;
        Ok(Some(Claimed {
            task_id: row.id,
            attempts: row.attempts,
            task,
        }))
    }

    pub async fn ack(&self, task_id: i64) -> Result<(), AppError> {
        QueueRepository::new(&self.pool).ack(task_id).await
    }

    pub async fn nack(&self, task_id: i64, delay: ChronoDuration) -> Result<(), AppError> {
        QueueRepository::new(&self.pool).nack(task_id, delay).await
    }
}
