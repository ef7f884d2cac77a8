//! Retention Sweeper (spec §2 RS, §4.4) — consumes the `cleanup` lane.

use chrono::Duration as ChronoDuration;
use sqlx::PgPool;

use crate::{queue::QueueClient, services::RetentionService};

const VISIBILITY_TIMEOUT: ChronoDuration = ChronoDuration::seconds(300);

pub struct RetentionSweeper {
    db: PgPool,
    queue: QueueClient,
    worker_id: String,
    retention_hours: i64,
    batch_size: i64,
}

impl RetentionSweeper {
    pub fn new(db: PgPool, queue: QueueClient, retention_hours: i64, batch_size: i64) -> Self {
        Self {
            db,
            queue,
            worker_id: format!("retention-sweeper-{}", std::process::id()),
            retention_hours,
            batch_size,
        }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("retention sweeper shutting down");
                        return;
                    }
                }
            }

            let claimed = match self
                .queue
                .consume_cleanup(&self.worker_id, VISIBILITY_TIMEOUT)
                .await
            {
                Ok(Some(claimed)) => claimed,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("failed to poll cleanup lane: {e}");
                    continue;
                }
            };

            let service = RetentionService::new(&self.db, self.retention_hours, self.batch_size);
            match service.sweep().await {
                Ok(deleted) => {
                    tracing::info!("retention sweep removed {deleted} delivery attempts");
                    if let Err(e) = self.queue.ack(claimed.task_id).await {
                        tracing::error!("failed to ack cleanup task {}: {e}", claimed.task_id);
                    }
                }
                Err(e) => {
                    tracing::error!("retention sweep failed: {e}");
                    if let Err(e) = self.queue.nack(claimed.task_id, ChronoDuration::seconds(30)).await {
                        tracing::error!("failed to nack cleanup task {}: {e}", claimed.task_id);
                    }
                }
            }
        }
    }
}
