//! Delivery Worker (spec §2 DW, §4.3, §5) — consumes the `deliver` lane.
//!
//! Concurrency model: a bounded semaphore caps in-flight outbound POSTs
//! at `OUTBOUND_CONCURRENCY` (spec §5's "global concurrency cap... to
//! prevent fan-out storms"); each claimed task runs to completion
//! (ack/nack) independently of the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::Semaphore;

use crate::{
    queue::QueueClient,
    services::{AttemptDisposition, DeliveryService},
};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const VISIBILITY_TIMEOUT: ChronoDuration = ChronoDuration::seconds(60);

pub struct DeliveryWorker {
    queue: QueueClient,
    delivery: Arc<DeliveryService>,
    worker_id: String,
    concurrency: Arc<Semaphore>,
}

impl DeliveryWorker {
    pub fn new(queue: QueueClient, delivery: Arc<DeliveryService>, outbound_concurrency: usize) -> Self {
        Self {
            queue,
            delivery,
            worker_id: format!("delivery-worker-{}", std::process::id()),
            concurrency: Arc::new(Semaphore::new(outbound_concurrency.max(1))),
        }
    }

    /// Runs until `shutdown` resolves. Intended to be spawned as a
    /// detached task from `main` and joined during graceful shutdown.
    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("delivery worker shutting down");
                        return;
                    }
                }
            }

            let permit = match self.concurrency.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => continue, // at capacity; wait for the next tick
            };

            let claimed = match self
                .queue
                .consume_deliver(&self.worker_id, VISIBILITY_TIMEOUT)
                .await
            {
                Ok(Some(claimed)) => claimed,
                Ok(None) => {
                    drop(permit);
                    continue;
                }
                Err(e) => {
                    tracing::error!("failed to poll deliver lane: {e}");
                    drop(permit);
                    continue;
                }
            };

            let queue = self.queue.clone();
            let delivery = self.delivery.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let task_id = claimed.task_id;
                match delivery.execute(claimed.task).await {
                    Ok(AttemptDisposition::Terminal) | Ok(AttemptDisposition::Rescheduled) => {
                        if let Err(e) = queue.ack(task_id).await {
                            tracing::error!("failed to ack deliver task {task_id}: {e}");
                        }
                    }
                    Err(e) => {
                        // Infrastructure failure: nack so the queue's
                        // visibility timeout redelivers the whole task
                        // (spec §7: never silent-drop an unexpected error).
                        tracing::error!("deliver task {task_id} failed: {e}");
                        if let Err(e) = queue.nack(task_id, ChronoDuration::seconds(10)).await {
                            tracing::error!("failed to nack deliver task {task_id}: {e}");
                        }
                    }
                }
            });
        }
    }
}
