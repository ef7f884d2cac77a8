//! Scheduler (spec §2 SCH, §4.4) — the sole producer on the `cleanup`
//! lane. A single logical timer; safe to run on more than one process
//! since the cleanup task itself is idempotent (spec: "neither [dedup nor
//! leader election] is load-bearing").

use std::time::Duration;

use crate::queue::QueueClient;

pub struct Scheduler {
    queue: QueueClient,
    interval: Duration,
}

impl Scheduler {
    pub fn new(queue: QueueClient, interval_minutes: i64) -> Self {
        Self {
            queue,
            interval: Duration::from_secs((interval_minutes.max(1) as u64) * 60),
        }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.tick().await; // first tick fires immediately; skip it

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("scheduler shutting down");
                        return;
                    }
                }
            }

            match self.queue.cleanup_pending().await {
                Ok(true) => {
                    tracing::debug!("cleanup task already pending, skipping emission");
                }
                Ok(false) => match self.queue.enqueue_cleanup().await {
                    Ok(id) => tracing::info!("emitted cleanup task {id}"),
                    Err(e) => tracing::error!("failed to emit cleanup task: {e}"),
                },
                Err(e) => tracing::error!("failed to check pending cleanup tasks: {e}"),
            }
        }
    }
}
